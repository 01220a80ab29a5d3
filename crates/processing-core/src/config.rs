//! Tuning constants for every pipeline stage.
//!
//! Each stage reads its own config struct. The defaults below are the values
//! the tracker ships with; tools may deserialize overrides, but the core
//! never reads configuration from anywhere itself.

use serde::{Deserialize, Serialize};
use tracelock_frame_model::color::Rgb;

/// Base color tolerance; stage tolerances are multiples of it.
pub const BASE_TOLERANCE: u32 = 15;

pub const DEFAULT_SCAN_STRIDE: u32 = 8;
pub const DEFAULT_GRAY_THRESHOLD: u8 = 20;
pub const DEFAULT_MATCH_TOLERANCE: u32 = BASE_TOLERANCE * 3;
pub const DEFAULT_REFINE_TOLERANCE: u32 = BASE_TOLERANCE * 4;
pub const DEFAULT_REFINE_RADIUS: i64 = 15;
pub const DEFAULT_REFINE_STRIDE: usize = 2;
pub const DEFAULT_OCCUPANCY_CELL: u32 = 40;
pub const DEFAULT_CENTER_EXCLUSION_RADIUS: f64 = 60.0;
pub const DEFAULT_MINIMAP_SIZE: u32 = 200;

pub const DEFAULT_SHIFT_SEARCH_RANGE: i64 = 150;
pub const DEFAULT_JUMP_THRESHOLD: i64 = 40;
pub const DEFAULT_ANCHOR_LUMA_CEILING: u8 = 205;
pub const DEFAULT_MIN_PROFILE_CONTRAST: u8 = 8;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_ASSOCIATION_DISTANCE: f64 = 60.0;

pub const DEFAULT_MIN_FIT_POINTS: usize = 5;
pub const DEFAULT_MIN_SPEED: f64 = 2.0;
pub const DEFAULT_MAX_RESIDUAL: f64 = 3.0;

pub const DEFAULT_PARALLEL_DOT: f64 = 0.95;
pub const DEFAULT_CLUSTER_RADIUS: f64 = 100.0;
pub const DEFAULT_MIN_CONVERGING: usize = 3;

pub const DEFAULT_IDENTITY_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_IDENTITY_RADIUS: i64 = 30;
pub const DEFAULT_IDENTITY_STRIDE: usize = 4;
pub const DEFAULT_IDENTITY_TOLERANCE: u32 = BASE_TOLERANCE * 2;
pub const DEFAULT_NOISE_FLOOR: usize = 10;

/// Own-color classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Minimum wall time between classifications (ms).
    pub interval_ms: u64,
    /// Half-size of the sampled square around the viewport center.
    pub radius: i64,
    /// Sampling stride inside the neighborhood.
    pub stride: usize,
    /// Inclusive Manhattan tolerance for a sample to count.
    pub tolerance: u32,
    /// A class needs strictly more samples than this to win.
    pub noise_floor: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_IDENTITY_INTERVAL_MS,
            radius: DEFAULT_IDENTITY_RADIUS,
            stride: DEFAULT_IDENTITY_STRIDE,
            tolerance: DEFAULT_IDENTITY_TOLERANCE,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

/// Blob detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Coarse scan stride in both axes.
    pub scan_stride: u32,
    /// Samples whose channels all lie within this of each other are background.
    pub gray_threshold: u8,
    /// Exclusive Manhattan tolerance for the coarse fingerprint match.
    pub match_tolerance: u32,
    /// Exclusive Manhattan tolerance inside the refinement window.
    pub refine_tolerance: u32,
    /// Half-size of the centroid refinement window.
    pub refine_radius: i64,
    pub refine_stride: usize,
    /// Occupancy grid cell size used for dedup.
    pub occupancy_cell: u32,
    /// Radius around the viewport center that is never scanned.
    pub center_exclusion_radius: f64,
    /// Side of the bottom-right minimap box that is never scanned.
    pub minimap_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scan_stride: DEFAULT_SCAN_STRIDE,
            gray_threshold: DEFAULT_GRAY_THRESHOLD,
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            refine_tolerance: DEFAULT_REFINE_TOLERANCE,
            refine_radius: DEFAULT_REFINE_RADIUS,
            refine_stride: DEFAULT_REFINE_STRIDE,
            occupancy_cell: DEFAULT_OCCUPANCY_CELL,
            center_exclusion_radius: DEFAULT_CENTER_EXCLUSION_RADIUS,
            minimap_size: DEFAULT_MINIMAP_SIZE,
        }
    }
}

/// How the per-tick background shift is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStrategy {
    /// Track the darkest grid-line pixel on each center scanline.
    AnchorLine,
    /// Align luminance profiles of the center scanlines.
    CrossCorrelation,
}

/// Background motion compensation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensatorConfig {
    pub strategy: ShiftStrategy,
    /// Half-width of the scanline span examined around the center.
    pub search_range: i64,
    /// Deltas with any component at or above this are rejected.
    pub jump_threshold: i64,
    /// Anchor-line pixels must be darker than this to count as grid lines.
    pub anchor_luma_ceiling: u8,
    /// Anchor-line pixels must also be near-gray, so colored objects
    /// crossing the scanline are never mistaken for grid lines.
    pub anchor_gray_threshold: u8,
    /// Profiles flatter than this (max - min luma) carry no shift signal.
    pub min_profile_contrast: u8,
}

impl Default for CompensatorConfig {
    fn default() -> Self {
        Self {
            strategy: ShiftStrategy::CrossCorrelation,
            search_range: DEFAULT_SHIFT_SEARCH_RANGE,
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
            anchor_luma_ceiling: DEFAULT_ANCHOR_LUMA_CEILING,
            anchor_gray_threshold: DEFAULT_GRAY_THRESHOLD,
            min_profile_contrast: DEFAULT_MIN_PROFILE_CONTRAST,
        }
    }
}

/// Trajectory association and lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Ring buffer capacity of each trajectory's history.
    pub history_capacity: usize,
    /// Detections farther than this from the prediction are not associated.
    pub association_distance: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            association_distance: DEFAULT_ASSOCIATION_DISTANCE,
        }
    }
}

/// Least-squares motion fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Histories shorter than this are not fitted.
    pub min_points: usize,
    /// Speed (px per tick) must exceed this for a reliable direction.
    pub min_speed: f64,
    /// Mean residual (px) must stay below this for a reliable direction.
    pub max_residual: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_FIT_POINTS,
            min_speed: DEFAULT_MIN_SPEED,
            max_residual: DEFAULT_MAX_RESIDUAL,
        }
    }
}

/// Source triangulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Ray pairs with |dot| above this are treated as parallel.
    pub parallel_dot: f64,
    /// Neighborhood radius for density clustering.
    pub cluster_radius: f64,
    /// Minimum number of reliable rays, and the base of the adaptive support floor.
    pub min_converging: usize,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            parallel_dot: DEFAULT_PARALLEL_DOT,
            cluster_radius: DEFAULT_CLUSTER_RADIUS,
            min_converging: DEFAULT_MIN_CONVERGING,
        }
    }
}

/// Overlay styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Number of most recent history points drawn as a trail.
    pub trail_length: usize,
    pub line_width: f64,
    /// Length of the dashed backward projection.
    pub ray_length: f64,
    pub ray_alpha: f64,
    pub ray_dash: [f64; 2],
    pub marker_radius: f64,
    pub marker_arm: f64,
    pub marker_width: f64,
    pub label_offset: f64,
    pub label_size: f64,
    /// Color of the marker, tether and label.
    pub target_color: Rgb,
    pub tether_width: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            trail_length: 10,
            line_width: 1.5,
            ray_length: 800.0,
            ray_alpha: 0.3,
            ray_dash: [5.0, 15.0],
            marker_radius: 20.0,
            marker_arm: 30.0,
            marker_width: 3.0,
            label_offset: 25.0,
            label_size: 20.0,
            target_color: Rgb::new(255, 0, 0),
            tether_width: 1.0,
        }
    }
}

/// Configuration for the whole tick pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub identity: IdentityConfig,
    pub detector: DetectorConfig,
    pub compensator: CompensatorConfig,
    pub track: TrackConfig,
    pub motion: MotionConfig,
    pub triangulation: TriangulationConfig,
    pub overlay: OverlayConfig,
}

impl TrackerConfig {
    /// Parse overrides; anything not mentioned keeps its default.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
