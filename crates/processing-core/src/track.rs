//! Trajectory tracking across ticks.
//!
//! Every trajectory is either matched this tick or removed at the end of it;
//! there is no grace period. Association is greedy: trajectories are visited
//! in insertion order and each claims the nearest unclaimed detection of its
//! color. This is an accepted approximation, not optimal assignment; two
//! same-colored trajectories crossing each other can swap detections.

use std::collections::VecDeque;

use tracelock_frame_model::color::ColorClass;
use tracelock_frame_model::geometry::Point2D;

use crate::blob_detect::Detection;
use crate::config::{MotionConfig, TrackConfig};
use crate::motion::{self, MotionEstimate};

/// Unique, never reused trajectory identifier.
pub type TrajectoryId = u64;

/// Fixed-capacity history; the oldest point is evicted on overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    points: VecDeque<Point2D>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, p: Point2D) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Point2D> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<Point2D> {
        self.points.back().copied()
    }

    /// The newest `n` points, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &Point2D> {
        self.points.iter().skip(self.points.len().saturating_sub(n))
    }

    /// Displacement between the two newest points.
    pub fn last_step(&self) -> Option<Point2D> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        Some(self.points[n - 1] - self.points[n - 2])
    }

    fn translate(&mut self, delta: Point2D) {
        for p in self.points.iter_mut() {
            *p -= delta;
        }
    }
}

/// A persistent track of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    id: TrajectoryId,
    color: ColorClass,
    position: Point2D,
    history: History,
    matched: bool,
    motion: Option<MotionEstimate>,
}

impl Trajectory {
    fn spawn(id: TrajectoryId, detection: &Detection, capacity: usize) -> Self {
        let mut history = History::new(capacity);
        history.push(detection.position);
        Self {
            id,
            color: detection.color,
            position: detection.position,
            history,
            matched: true,
            motion: None,
        }
    }

    pub fn id(&self) -> TrajectoryId {
        self.id
    }

    pub fn color(&self) -> ColorClass {
        self.color
    }

    /// Current head position.
    pub fn position(&self) -> Point2D {
        self.position
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether a detection was associated this tick.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Motion fit from the latest tick, if the history was long enough.
    pub fn motion(&self) -> Option<&MotionEstimate> {
        self.motion.as_ref()
    }

    /// Expected position this tick, extrapolated from the last step.
    pub fn predicted_position(&self) -> Point2D {
        match self.history.last_step() {
            Some(step) => self.position + step,
            None => self.position,
        }
    }

    fn accept(&mut self, p: Point2D) {
        self.position = p;
        self.history.push(p);
        self.matched = true;
    }
}

/// Per-tick association counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackUpdate {
    pub continued: usize,
    pub spawned: usize,
    pub dropped: usize,
}

/// Owns the trajectory set and the id counter.
#[derive(Debug, Clone)]
pub struct TrackManager {
    trajectories: Vec<Trajectory>,
    next_id: TrajectoryId,
    claimed: Vec<bool>,
}

impl Default for TrackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackManager {
    pub fn new() -> Self {
        Self {
            trajectories: Vec::new(),
            next_id: 1,
            claimed: Vec::new(),
        }
    }

    /// Live trajectories in insertion order.
    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Id the next spawned trajectory will get.
    pub fn next_id(&self) -> TrajectoryId {
        self.next_id
    }

    /// Discard every trajectory. Ids keep counting up.
    pub fn clear(&mut self) -> usize {
        let n = self.trajectories.len();
        self.trajectories.clear();
        n
    }

    /// Move every stored position by `-delta`.
    pub fn translate_all(&mut self, delta: Point2D) {
        for t in self.trajectories.iter_mut() {
            t.position -= delta;
            t.history.translate(delta);
        }
    }

    /// Associate this tick's detections, spawn new trajectories for the
    /// leftovers and drop every trajectory that found no match.
    pub fn update(&mut self, detections: &[Detection], config: &TrackConfig) -> TrackUpdate {
        self.claimed.clear();
        self.claimed.resize(detections.len(), false);
        let mut stats = TrackUpdate::default();

        for t in self.trajectories.iter_mut() {
            t.matched = false;
            let predicted = t.predicted_position();

            let mut best: Option<(usize, f64)> = None;
            for (i, d) in detections.iter().enumerate() {
                if self.claimed[i] || d.color != t.color {
                    continue;
                }
                let dist = d.position.distance_to(&predicted);
                if dist < config.association_distance && best.map_or(true, |(_, bd)| dist < bd) {
                    best = Some((i, dist));
                }
            }

            if let Some((i, _)) = best {
                self.claimed[i] = true;
                t.accept(detections[i].position);
                stats.continued += 1;
            }
        }

        let before = self.trajectories.len();
        self.trajectories.retain(|t| t.matched);
        stats.dropped = before - self.trajectories.len();

        for (d, claimed) in detections.iter().zip(&self.claimed) {
            if *claimed {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            self.trajectories
                .push(Trajectory::spawn(id, d, config.history_capacity));
            stats.spawned += 1;
        }

        stats
    }

    /// Recompute the cached motion fit of every trajectory.
    pub fn refresh_motion(&mut self, config: &MotionConfig) {
        for t in self.trajectories.iter_mut() {
            t.motion = motion::estimate(t.history.iter(), config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn det(x: f64, y: f64, color: ColorClass) -> Detection {
        Detection {
            position: Point2D::new(x, y),
            color,
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(Point2D::new(i as f64, 0.0));
        }
        assert_eq!(h.len(), 3);
        let xs: Vec<f64> = h.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_tail_returns_newest_points() {
        let mut h = History::new(10);
        for i in 0..6 {
            h.push(Point2D::new(i as f64, 0.0));
        }
        let xs: Vec<f64> = h.tail(2).map(|p| p.x).collect();
        assert_eq!(xs, vec![4.0, 5.0]);
        assert_eq!(h.tail(50).count(), 6);
    }

    #[test]
    fn test_detections_spawn_then_continue() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();

        let stats = tracks.update(&[det(100.0, 100.0, ColorClass::Red)], &config);
        assert_eq!(stats.spawned, 1);
        let id = tracks.trajectories()[0].id();

        let stats = tracks.update(&[det(105.0, 102.0, ColorClass::Red)], &config);
        assert_eq!(stats, TrackUpdate { continued: 1, spawned: 0, dropped: 0 });
        assert_eq!(tracks.trajectories()[0].id(), id);
        assert_eq!(tracks.trajectories()[0].history().len(), 2);
    }

    #[test]
    fn test_color_must_match() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(100.0, 100.0, ColorClass::Red)], &config);
        let stats = tracks.update(&[det(101.0, 100.0, ColorClass::Blue)], &config);
        assert_eq!(stats, TrackUpdate { continued: 0, spawned: 1, dropped: 1 });
        assert_eq!(tracks.trajectories()[0].color(), ColorClass::Blue);
    }

    #[test]
    fn test_missed_tick_terminates_and_reacquisition_gets_new_id() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(100.0, 100.0, ColorClass::Green)], &config);
        let first = tracks.trajectories()[0].id();

        tracks.update(&[], &config);
        assert!(tracks.is_empty());

        tracks.update(&[det(100.0, 100.0, ColorClass::Green)], &config);
        assert!(tracks.trajectories()[0].id() > first);
    }

    #[test]
    fn test_far_detection_is_not_associated() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(100.0, 100.0, ColorClass::Red)], &config);
        let stats = tracks.update(&[det(100.0, 100.0 + config.association_distance, ColorClass::Red)], &config);
        assert_eq!(stats.continued, 0);
        assert_eq!(stats.spawned, 1);
    }

    #[test]
    fn test_prediction_uses_last_step() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(100.0, 100.0, ColorClass::Red)], &config);
        tracks.update(&[det(140.0, 100.0, ColorClass::Red)], &config);
        // 70px from the head but only 30px from the extrapolated position.
        let stats = tracks.update(&[det(210.0, 100.0, ColorClass::Red)], &config);
        assert_eq!(stats.continued, 1);
        assert_eq!(
            tracks.trajectories()[0].predicted_position(),
            Point2D::new(280.0, 100.0)
        );
    }

    #[test]
    fn test_first_trajectory_wins_contested_detection() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(
            &[det(100.0, 100.0, ColorClass::Red), det(130.0, 100.0, ColorClass::Red)],
            &config,
        );
        let (a, b) = (tracks.trajectories()[0].id(), tracks.trajectories()[1].id());

        // Only one detection, closer to the second trajectory.
        tracks.update(&[det(125.0, 100.0, ColorClass::Red)], &config);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks.trajectories()[0].id(), a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_translate_all_moves_history() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(100.0, 100.0, ColorClass::Red)], &config);
        tracks.update(&[det(104.0, 100.0, ColorClass::Red)], &config);
        tracks.translate_all(Point2D::new(4.0, -2.0));

        let t = &tracks.trajectories()[0];
        assert_eq!(t.position(), Point2D::new(100.0, 102.0));
        let pts: Vec<Point2D> = t.history().iter().copied().collect();
        assert_eq!(pts, vec![Point2D::new(96.0, 102.0), Point2D::new(100.0, 102.0)]);
    }

    #[test]
    fn test_refresh_motion_after_enough_points() {
        let config = TrackConfig::default();
        let motion = MotionConfig::default();
        let mut tracks = TrackManager::new();
        for k in 0..motion.min_points {
            tracks.update(&[det(100.0 + 5.0 * k as f64, 100.0, ColorClass::Purple)], &config);
            tracks.refresh_motion(&motion);
        }
        let est = tracks.trajectories()[0].motion().unwrap();
        assert!((est.velocity.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_keeps_id_sequence() {
        let config = TrackConfig::default();
        let mut tracks = TrackManager::new();
        tracks.update(&[det(1.0, 1.0, ColorClass::Red)], &config);
        assert_eq!(tracks.clear(), 1);
        assert_eq!(tracks.next_id(), 2);
    }

    fn detection_strategy() -> impl Strategy<Value = Detection> {
        (0.0f64..400.0, 0.0f64..400.0, 0usize..4).prop_map(|(x, y, c)| det(x, y, ColorClass::ALL[c]))
    }

    proptest! {
        #[test]
        fn history_never_exceeds_capacity(capacity in 1usize..40, pushes in 0usize..120) {
            let mut h = History::new(capacity);
            for i in 0..pushes {
                h.push(Point2D::new(i as f64, 0.0));
                prop_assert!(h.len() <= capacity);
            }
            prop_assert_eq!(h.len(), pushes.min(capacity));
        }

        #[test]
        fn association_is_deterministic(
            seed in prop::collection::vec(detection_strategy(), 0..12),
            next in prop::collection::vec(detection_strategy(), 0..12),
        ) {
            let config = TrackConfig::default();
            let mut tracks = TrackManager::new();
            tracks.update(&seed, &config);

            let mut a = tracks.clone();
            let mut b = tracks.clone();
            let sa = a.update(&next, &config);
            let sb = b.update(&next, &config);
            prop_assert_eq!(sa, sb);
            prop_assert_eq!(a.trajectories(), b.trajectories());
        }

        #[test]
        fn tracked_ids_are_unique(
            ticks in prop::collection::vec(prop::collection::vec(detection_strategy(), 0..8), 1..10),
        ) {
            let config = TrackConfig::default();
            let mut tracks = TrackManager::new();
            let mut seen_max = 0;
            for detections in &ticks {
                tracks.update(detections, &config);
                let mut ids: Vec<_> = tracks.trajectories().iter().map(|t| t.id()).collect();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), tracks.len());
                prop_assert_eq!(tracks.len(), detections.len());
                seen_max = seen_max.max(ids.last().copied().unwrap_or(0));
                prop_assert!(tracks.next_id() > seen_max);
            }
        }
    }
}
