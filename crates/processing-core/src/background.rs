//! Background motion compensation.
//!
//! The scene scrolls under a fixed viewpoint, so positions recorded on
//! earlier ticks drift relative to new detections. Each tick we measure how
//! far the view scrolled since the previous tick, using one of two
//! strategies on the scanlines through the viewport center:
//!
//! - **Anchor line:** the darkest near-gray pixel on each scanline is taken to
//!   be a grid line; its displacement is the shift.
//! - **Cross-correlation:** the luminance profile of each scanline is aligned
//!   against the previous tick's profile by minimizing mean absolute
//!   difference. Colored samples, such as our own object parked at the
//!   center, are masked out of both profiles.
//!
//! A shift of `(dx, dy)` means the view moved by that much, so world-fixed
//! content moved by `(-dx, -dy)` on screen. Subtracting the shift from stored
//! positions puts them in the current frame's coordinates. The stored
//! reference is replaced every tick; deltas are never summed.

use serde::{Deserialize, Serialize};
use tracelock_frame_model::color::Rgb;
use tracelock_frame_model::frame::FrameView;
use tracelock_frame_model::geometry::Point2D;

use crate::config::{CompensatorConfig, ShiftStrategy};

/// Outcome of one shift measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftEstimate {
    /// The view scrolled by `(dx, dy)` pixels since the previous tick.
    Shift { dx: i64, dy: i64 },
    /// No previous reference to compare against (first tick or a resize).
    NoReference,
    /// No anchor could be located this tick.
    LockLost,
    /// A delta was measured but it is too large to be real motion.
    JumpRejected { dx: i64, dy: i64 },
}

impl ShiftEstimate {
    /// The delta to apply to stored positions, if any.
    pub fn delta(&self) -> Option<Point2D> {
        match *self {
            ShiftEstimate::Shift { dx, dy } if dx != 0 || dy != 0 => {
                Some(Point2D::new(dx as f64, dy as f64))
            }
            _ => None,
        }
    }
}

/// Reference sample from the previous tick.
#[derive(Debug, Default)]
pub struct BackgroundAnchor {
    valid: bool,
    width: u32,
    height: u32,
    line_x: i64,
    line_y: i64,
    row_profile: Vec<Option<u8>>,
    col_profile: Vec<Option<u8>>,
    scratch_row: Vec<Option<u8>>,
    scratch_col: Vec<Option<u8>>,
}

impl BackgroundAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Drop the reference; the next tick starts a fresh one.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Measure this tick's shift and replace the reference with this frame.
    pub fn estimate(
        &mut self,
        frame: &FrameView<'_>,
        config: &CompensatorConfig,
    ) -> ShiftEstimate {
        if frame.is_empty() {
            self.invalidate();
            return ShiftEstimate::LockLost;
        }
        let comparable =
            self.valid && self.width == frame.width() && self.height == frame.height();
        self.width = frame.width();
        self.height = frame.height();

        let raw = match config.strategy {
            ShiftStrategy::AnchorLine => self.anchor_line(frame, config, comparable),
            ShiftStrategy::CrossCorrelation => self.cross_correlation(frame, config, comparable),
        };

        match raw {
            ShiftEstimate::Shift { dx, dy }
                if dx.abs() >= config.jump_threshold || dy.abs() >= config.jump_threshold =>
            {
                ShiftEstimate::JumpRejected { dx, dy }
            }
            other => other,
        }
    }

    fn anchor_line(
        &mut self,
        frame: &FrameView<'_>,
        config: &CompensatorConfig,
        comparable: bool,
    ) -> ShiftEstimate {
        let (cx, cy) = frame.center_pixel();
        let range = config.search_range;
        let bx = darkest_gray((cx - range..cx + range).map(|x| (x, cy)), frame, config);
        let by = darkest_gray((cy - range..cy + range).map(|y| (cx, y)), frame, config);

        let (Some((bx, _)), Some((_, by))) = (bx, by) else {
            self.valid = false;
            return ShiftEstimate::LockLost;
        };

        let result = if comparable {
            ShiftEstimate::Shift {
                dx: self.line_x - bx,
                dy: self.line_y - by,
            }
        } else {
            ShiftEstimate::NoReference
        };
        self.line_x = bx;
        self.line_y = by;
        self.valid = true;
        result
    }

    fn cross_correlation(
        &mut self,
        frame: &FrameView<'_>,
        config: &CompensatorConfig,
        comparable: bool,
    ) -> ShiftEstimate {
        let (cx, cy) = frame.center_pixel();
        let max_offset = (config.jump_threshold - 1).max(0);

        let gray_luma = |pixel: Rgb| {
            (pixel.chroma_spread() < config.anchor_gray_threshold).then(|| pixel.luma())
        };
        self.scratch_row.clear();
        self.scratch_row
            .extend((0..frame.width()).map(|x| gray_luma(frame.rgb(x, cy as u32))));
        self.scratch_col.clear();
        self.scratch_col
            .extend((0..frame.height()).map(|y| gray_luma(frame.rgb(cx as u32, y))));

        let half = config.search_range;
        let row_window = ProfileWindow::new(cx, half, max_offset, self.scratch_row.len());
        let col_window = ProfileWindow::new(cy, half, max_offset, self.scratch_col.len());

        let textured = match (row_window, col_window) {
            (Some(rw), Some(cw)) => {
                rw.contrast(&self.scratch_row) >= config.min_profile_contrast
                    && cw.contrast(&self.scratch_col) >= config.min_profile_contrast
            }
            _ => false,
        };

        std::mem::swap(&mut self.row_profile, &mut self.scratch_row);
        std::mem::swap(&mut self.col_profile, &mut self.scratch_col);

        if !textured {
            self.valid = false;
            return ShiftEstimate::LockLost;
        }
        self.valid = true;
        if !comparable {
            return ShiftEstimate::NoReference;
        }

        // Both windows exist when textured is true.
        let (Some(rw), Some(cw)) = (row_window, col_window) else {
            return ShiftEstimate::LockLost;
        };
        // After the swap the scratch buffers hold the previous tick's profiles.
        let dx = best_offset(&self.scratch_row, &self.row_profile, rw, max_offset);
        let dy = best_offset(&self.scratch_col, &self.col_profile, cw, max_offset);
        match (dx, dy) {
            (Some(dx), Some(dy)) => ShiftEstimate::Shift { dx, dy },
            _ => ShiftEstimate::LockLost,
        }
    }
}

/// Darkest near-gray pixel below the luma ceiling; first found wins ties.
fn darkest_gray(
    coords: impl Iterator<Item = (i64, i64)>,
    frame: &FrameView<'_>,
    config: &CompensatorConfig,
) -> Option<(i64, i64)> {
    let mut best: Option<((i64, i64), u8)> = None;
    for (x, y) in coords {
        let Some(pixel) = frame.rgb_checked(x, y) else {
            continue;
        };
        if pixel.chroma_spread() >= config.anchor_gray_threshold {
            continue;
        }
        let luma = pixel.luma();
        if luma >= config.anchor_luma_ceiling {
            continue;
        }
        if best.map_or(true, |(_, l)| luma < l) {
            best = Some(((x, y), luma));
        }
    }
    best.map(|(p, _)| p)
}

/// Central span of a profile compared under every candidate offset.
#[derive(Debug, Clone, Copy)]
struct ProfileWindow {
    start: usize,
    end: usize,
}

impl ProfileWindow {
    /// Window of half-width `half` around `center`, shrunk so that every
    /// index stays in bounds under offsets up to `max_offset`.
    fn new(center: i64, half: i64, max_offset: i64, len: usize) -> Option<Self> {
        let start = (center - half).max(max_offset);
        let end = (center + half).min(len as i64 - max_offset);
        if end <= start {
            return None;
        }
        Some(Self {
            start: start as usize,
            end: end as usize,
        })
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    /// Luminance range of the gray samples in the window.
    fn contrast(&self, profile: &[Option<u8>]) -> u8 {
        let span = profile[self.start..self.end].iter().flatten();
        let max = span.clone().copied().max().unwrap_or(0);
        let min = span.copied().min().unwrap_or(0);
        max - min
    }
}

/// Offset `s` minimizing the mean of `|current[i] - previous[i + s]|` over the
/// window, counting only indices where both samples are gray. An offset that
/// leaves fewer than half the window comparable is not a candidate.
/// Offsets are tried in order 0, 1, -1, 2, -2, ... so ties go to the smallest shift.
fn best_offset(
    previous: &[Option<u8>],
    current: &[Option<u8>],
    window: ProfileWindow,
    max_offset: i64,
) -> Option<i64> {
    let min_samples = (window.len() / 2).max(1) as u64;
    let sad = |s: i64| -> (u64, u64) {
        (window.start..window.end)
            .filter_map(|i| {
                let j = (i as i64 + s) as usize;
                Some(current[i]?.abs_diff(previous[j]?) as u64)
            })
            .fold((0, 0), |(sum, n), d| (sum + d, n + 1))
    };

    let mut best: Option<(i64, u64, u64)> = None;
    let offsets = std::iter::once(0).chain((1..=max_offset).flat_map(|k| [k, -k]));
    for s in offsets {
        let (cost, n) = sad(s);
        if n < min_samples {
            continue;
        }
        // cost / n < best_cost / best_n without division.
        if best.map_or(true, |(_, bc, bn)| cost * bn < bc * n) {
            best = Some((s, cost, n));
        }
    }
    best.map(|(s, _, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelock_frame_model::color::ColorClass;
    use tracelock_frame_model::frame::OwnedFrame;

    const FILL: Rgb = Rgb::new(205, 205, 205);
    const LINE: Rgb = Rgb::new(180, 180, 180);

    const GRID_PERIOD: i64 = 37;

    /// Grid line intensity varies per line so aliased offsets never match exactly.
    fn grid_luma(w: i64) -> Option<u8> {
        if w.rem_euclid(GRID_PERIOD) != 0 {
            return None;
        }
        let k = w.div_euclid(GRID_PERIOD);
        Some(140 + (k * 53).rem_euclid(50) as u8)
    }

    /// Grid background in world coordinates.
    fn texture(wx: i64, wy: i64) -> Rgb {
        let l = match (grid_luma(wx), grid_luma(wy)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => FILL.r,
        };
        Rgb::new(l, l, l)
    }

    /// The world texture seen through a view scrolled to `(ox, oy)`.
    fn textured_frame(ox: i64, oy: i64) -> OwnedFrame {
        let mut frame = OwnedFrame::filled(800, 600, FILL);
        for y in 0..600 {
            for x in 0..800 {
                frame.put(x, y, texture(x + ox, y + oy));
            }
        }
        frame
    }

    fn line_frame(line_x: i64, line_y: i64) -> OwnedFrame {
        let mut frame = OwnedFrame::filled(800, 600, FILL);
        for y in 0..600 {
            frame.put(line_x, y, LINE);
        }
        for x in 0..800 {
            frame.put(x, line_y, LINE);
        }
        frame
    }

    /// Our own object, fixed at the center of an 800x600 view.
    fn with_center_tank(mut frame: OwnedFrame) -> OwnedFrame {
        frame.fill_circle(Point2D::new(400.0, 300.0), 25.0, ColorClass::Red.fingerprint());
        frame
    }

    fn anchor_config() -> CompensatorConfig {
        CompensatorConfig {
            strategy: ShiftStrategy::AnchorLine,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_tick_has_no_reference() {
        let mut anchor = BackgroundAnchor::new();
        let frame = textured_frame(0, 0);
        let est = anchor.estimate(&frame.view(), &CompensatorConfig::default());
        assert_eq!(est, ShiftEstimate::NoReference);
        assert!(anchor.is_valid());
    }

    #[test]
    fn test_cross_correlation_recovers_shift() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&textured_frame(0, 0).view(), &config);
        let est = anchor.estimate(&textured_frame(-7, 4).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: -7, dy: 4 });
    }

    #[test]
    fn test_cross_correlation_only_compares_consecutive_ticks() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&textured_frame(0, 0).view(), &config);
        anchor.estimate(&textured_frame(5, 5).view(), &config);
        let est = anchor.estimate(&textured_frame(8, 5).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: 3, dy: 0 });
    }

    #[test]
    fn test_cross_correlation_ignores_static_center_object() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&with_center_tank(textured_frame(0, 0)).view(), &config);
        for k in 1..5 {
            let frame = with_center_tank(textured_frame(3 * k, 2 * k));
            let est = anchor.estimate(&frame.view(), &config);
            assert_eq!(est, ShiftEstimate::Shift { dx: 3, dy: 2 }, "tick {k}");
        }
    }

    #[test]
    fn test_cross_correlation_handles_negative_shift_behind_center_object() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&with_center_tank(textured_frame(0, 0)).view(), &config);
        let est = anchor.estimate(&with_center_tank(textured_frame(-7, 4)).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: -7, dy: 4 });
    }

    #[test]
    fn test_colored_scanlines_lose_lock() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        let colored = OwnedFrame::filled(800, 600, ColorClass::Blue.fingerprint());
        assert_eq!(anchor.estimate(&colored.view(), &config), ShiftEstimate::LockLost);
        assert!(!anchor.is_valid());
    }

    #[test]
    fn test_flat_background_loses_lock() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        let flat = OwnedFrame::filled(800, 600, FILL);
        assert_eq!(anchor.estimate(&flat.view(), &config), ShiftEstimate::LockLost);
        assert!(!anchor.is_valid());
        assert_eq!(anchor.estimate(&flat.view(), &config).delta(), None);
    }

    #[test]
    fn test_anchor_line_recovers_shift() {
        let config = anchor_config();
        let mut anchor = BackgroundAnchor::new();
        assert_eq!(
            anchor.estimate(&line_frame(380, 280).view(), &config),
            ShiftEstimate::NoReference
        );
        // Lines moving right and up on screen means the view scrolled left and down.
        let est = anchor.estimate(&line_frame(385, 277).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: -5, dy: 3 });
        assert_eq!(est.delta(), Some(Point2D::new(-5.0, 3.0)));
    }

    #[test]
    fn test_anchor_line_ignores_static_center_object() {
        let config = anchor_config();
        let mut anchor = BackgroundAnchor::new();
        // The tank is darker than the lines but colored, so it never anchors.
        anchor.estimate(&with_center_tank(line_frame(340, 250)).view(), &config);
        assert_eq!((anchor.line_x, anchor.line_y), (340, 250));
        let est = anchor.estimate(&with_center_tank(line_frame(337, 248)).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: 3, dy: 2 });
    }

    #[test]
    fn test_anchor_line_rejects_jumps() {
        let config = anchor_config();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&line_frame(300, 280).view(), &config);
        let est = anchor.estimate(&line_frame(460, 280).view(), &config);
        assert_eq!(est, ShiftEstimate::JumpRejected { dx: -160, dy: 0 });
        assert_eq!(est.delta(), None);

        // The reference was still replaced: small motion from the new spot is accepted.
        let est = anchor.estimate(&line_frame(462, 280).view(), &config);
        assert_eq!(est, ShiftEstimate::Shift { dx: -2, dy: 0 });
    }

    #[test]
    fn test_anchor_line_ignores_colored_pixels() {
        let config = anchor_config();
        let mut frame = line_frame(380, 280);
        // A saturated dark object on the horizontal scanline.
        for x in 420..430 {
            frame.put(x, 300, Rgb::new(0, 176, 225));
        }
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&frame.view(), &config);
        assert_eq!(anchor.line_x, 380);
    }

    #[test]
    fn test_resize_drops_reference() {
        let config = CompensatorConfig::default();
        let mut anchor = BackgroundAnchor::new();
        anchor.estimate(&textured_frame(0, 0).view(), &config);
        let mut small = OwnedFrame::filled(640, 480, FILL);
        for y in 0..480 {
            for x in 0..640 {
                small.put(x, y, texture(x, y));
            }
        }
        assert_eq!(anchor.estimate(&small.view(), &config), ShiftEstimate::NoReference);
    }
}
