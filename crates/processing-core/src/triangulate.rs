//! Source triangulation from converging trajectories.
//!
//! Every reliable trajectory is projected backward from its head. Pairwise
//! ray intersections form a point cloud, and the densest neighborhood of that
//! cloud is the estimate.

use serde::{Deserialize, Serialize};
use tracelock_frame_model::color::ColorClass;
use tracelock_frame_model::geometry::{Point2D, Ray};

use crate::config::{MotionConfig, TriangulationConfig};
use crate::track::Trajectory;

/// Inferred common origin of the current rays. Recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEstimate {
    pub position: Point2D,
    /// Intersection points within the clustering radius of the chosen center.
    pub support: usize,
}

/// Triangulator with point buffers reused across ticks.
#[derive(Debug, Default)]
pub struct Triangulator {
    rays: Vec<Ray>,
    points: Vec<Point2D>,
}

impl Triangulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solve(
        &mut self,
        trajectories: &[Trajectory],
        own_color: Option<ColorClass>,
        motion: &MotionConfig,
        config: &TriangulationConfig,
    ) -> Option<TargetEstimate> {
        self.rays.clear();
        self.rays
            .extend(trajectories.iter().filter_map(|t| backward_ray(t, own_color, motion)));
        locate(&self.rays, config, &mut self.points)
    }
}

/// Backward ray of a reliable trajectory not of the own color.
pub fn backward_ray(
    trajectory: &Trajectory,
    own_color: Option<ColorClass>,
    motion: &MotionConfig,
) -> Option<Ray> {
    if Some(trajectory.color()) == own_color {
        return None;
    }
    let estimate = trajectory.motion().filter(|m| m.is_reliable(motion))?;
    Ray::new(trajectory.position(), estimate.backward_direction()?)
}

/// Estimate the common origin of `rays`.
pub fn triangulate(rays: &[Ray], config: &TriangulationConfig) -> Option<TargetEstimate> {
    let mut points = Vec::new();
    locate(rays, config, &mut points)
}

fn locate(
    rays: &[Ray],
    config: &TriangulationConfig,
    points: &mut Vec<Point2D>,
) -> Option<TargetEstimate> {
    points.clear();
    if rays.len() < config.min_converging.max(2) {
        return None;
    }

    for (i, a) in rays.iter().enumerate() {
        for b in &rays[i + 1..] {
            if a.direction.dot(&b.direction).abs() > config.parallel_dot {
                continue;
            }
            if let Some(p) = intersect(a, b) {
                points.push(p);
            }
        }
    }

    densest_cluster(points, support_floor(rays.len(), config), config.cluster_radius)
}

/// Forward intersection of two rays, or `None` if they are parallel or meet
/// behind either origin.
pub fn intersect(a: &Ray, b: &Ray) -> Option<Point2D> {
    let denom = a.direction.cross(&b.direction);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let w = b.origin - a.origin;
    let t = w.cross(&b.direction) / denom;
    let u = w.cross(&a.direction) / denom;
    if t < 0.0 || u < 0.0 {
        return None;
    }
    Some(a.at(t))
}

/// Minimum neighbor count for a valid cluster center.
fn support_floor(ray_count: usize, config: &TriangulationConfig) -> f64 {
    (config.min_converging as f64 * ray_count as f64 / 4.0).max(3.0)
}

fn densest_cluster(points: &[Point2D], floor: f64, radius: f64) -> Option<TargetEstimate> {
    let radius_sq = radius * radius;
    let mut best: Option<(usize, usize)> = None;

    for (i, p) in points.iter().enumerate() {
        let count = points.iter().filter(|q| q.distance_sq(p) < radius_sq).count();
        if (count as f64) < floor {
            continue;
        }
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((i, count));
        }
    }

    let (center, support) = best?;
    let center = points[center];
    let position = Point2D::centroid(points.iter().filter(|q| q.distance_sq(&center) < radius_sq))?;
    Some(TargetEstimate { position, support })
}
