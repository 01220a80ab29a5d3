//! Per-trajectory motion estimation.
//!
//! Fits `position = base + velocity * k` by ordinary least squares, where `k`
//! is the point's index in the history (oldest = 0). Using the index rather
//! than wall time keeps the fit independent of host frame-rate jitter, so
//! velocities are in pixels per tick.

use tracelock_frame_model::geometry::Point2D;

use crate::config::MotionConfig;

/// Fitted linear motion of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEstimate {
    /// Slope of position against history index (px per tick).
    pub velocity: Point2D,
    /// Mean Euclidean distance between each point and the fitted line.
    pub residual: f64,
}

impl MotionEstimate {
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Fast enough to not be jitter, and straight enough to extrapolate.
    pub fn is_reliable(&self, config: &MotionConfig) -> bool {
        self.speed() > config.min_speed && self.residual < config.max_residual
    }

    /// Unit vector pointing back along the direction of travel.
    pub fn backward_direction(&self) -> Option<Point2D> {
        (-self.velocity).normalized()
    }
}

/// Fit a history, or `None` if it is shorter than `config.min_points`.
pub fn estimate<'a, I>(points: I, config: &MotionConfig) -> Option<MotionEstimate>
where
    I: IntoIterator<Item = &'a Point2D>,
    I::IntoIter: ExactSizeIterator + Clone,
{
    let points = points.into_iter();
    if points.len() < config.min_points.max(2) {
        return None;
    }
    fit_linear(points)
}

/// Least-squares line through `points` indexed 0..n.
pub fn fit_linear<'a, I>(points: I) -> Option<MotionEstimate>
where
    I: Iterator<Item = &'a Point2D> + ExactSizeIterator + Clone,
{
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let t_mean = (nf - 1.0) / 2.0;
    let mean = Point2D::centroid(points.clone())?;

    let mut s_tt = 0.0;
    let mut s_t = Point2D::ZERO;
    for (i, p) in points.clone().enumerate() {
        let dt = i as f64 - t_mean;
        s_tt += dt * dt;
        s_t += (*p - mean) * dt;
    }
    if s_tt <= 0.0 {
        return None;
    }
    let velocity = s_t * (1.0 / s_tt);

    let residual = points
        .enumerate()
        .map(|(i, p)| {
            let fitted = mean + velocity * (i as f64 - t_mean);
            p.distance_to(&fitted)
        })
        .sum::<f64>()
        / nf;

    Some(MotionEstimate { velocity, residual })
}
