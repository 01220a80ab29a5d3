//! Sparse color-blob detection.
//!
//! # Algorithm
//!
//! 1. **Scan** the frame on a coarse stride, skipping the own-object disc at
//!    the center and the minimap box in the bottom-right corner.
//! 2. **Gate** each sample: near-gray pixels are background; the rest are
//!    tested against every fingerprint except the own color, first match wins.
//! 3. **Refine** a match to the mean position of matching pixels in a small
//!    window around the sample.
//! 4. **Dedup** by marking the 3x3 occupancy cells around the centroid, so
//!    later stride samples on the same blob are skipped.

use tracelock_frame_model::color::{ColorClass, Rgb};
use tracelock_frame_model::frame::FrameView;
use tracelock_frame_model::geometry::Point2D;

use crate::config::DetectorConfig;

/// One tick's observation of a blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub position: Point2D,
    pub color: ColorClass,
}

/// Blob detector with buffers reused across ticks.
#[derive(Debug, Default)]
pub struct BlobDetector {
    occupancy: OccupancyGrid,
    detections: Vec<Detection>,
}

impl BlobDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect blobs in `frame`, ignoring `own_color`.
    ///
    /// The returned slice is valid until the next call.
    pub fn detect(
        &mut self,
        frame: &FrameView<'_>,
        own_color: Option<ColorClass>,
        config: &DetectorConfig,
    ) -> &[Detection] {
        self.detections.clear();
        if frame.is_empty() {
            return &self.detections;
        }

        let width = frame.width();
        let height = frame.height();
        let stride = config.scan_stride.max(1) as usize;
        let exclusion = ScanExclusion::for_frame(frame, config);
        self.occupancy
            .reset(width, height, config.occupancy_cell.max(1));

        for y in (0..height).step_by(stride) {
            for x in (0..width).step_by(stride) {
                if exclusion.skips(x, y) || self.occupancy.is_marked(x, y) {
                    continue;
                }

                let pixel = frame.rgb(x, y);
                if pixel.chroma_spread() < config.gray_threshold {
                    continue;
                }

                let Some(color) = match_class(&pixel, own_color, config.match_tolerance) else {
                    continue;
                };

                let position = refine_centroid(frame, x, y, color, config);
                self.detections.push(Detection { position, color });
                self.occupancy.mark_around(position);
            }
        }

        &self.detections
    }
}

/// First class in enumeration order, other than `own_color`, within tolerance.
pub fn match_class(pixel: &Rgb, own_color: Option<ColorClass>, tolerance: u32) -> Option<ColorClass> {
    ColorClass::ALL
        .into_iter()
        .filter(|class| Some(*class) != own_color)
        .find(|class| class.matches(pixel, tolerance))
}

/// Mean position of pixels matching `color` in the refine window around
/// `(sx, sy)`, or the sample point itself when nothing matches.
pub fn refine_centroid(
    frame: &FrameView<'_>,
    sx: u32,
    sy: u32,
    color: ColorClass,
    config: &DetectorConfig,
) -> Point2D {
    let radius = config.refine_radius;
    let step = config.refine_stride.max(1);
    let (sx, sy) = (sx as i64, sy as i64);

    let mut sum_x = 0i64;
    let mut sum_y = 0i64;
    let mut count = 0i64;

    for y in (sy - radius..=sy + radius).step_by(step) {
        for x in (sx - radius..=sx + radius).step_by(step) {
            let Some(pixel) = frame.rgb_checked(x, y) else {
                continue;
            };
            if color.matches(&pixel, config.refine_tolerance) {
                sum_x += x;
                sum_y += y;
                count += 1;
            }
        }
    }

    if count == 0 {
        return Point2D::new(sx as f64, sy as f64);
    }
    Point2D::new(sum_x as f64 / count as f64, sum_y as f64 / count as f64)
}

/// Regions of the current frame that are never scanned.
/// Derived from the frame's own dimensions every tick.
#[derive(Debug, Clone, Copy)]
struct ScanExclusion {
    center: Point2D,
    center_radius_sq: f64,
    minimap_x: u32,
    minimap_y: u32,
}

impl ScanExclusion {
    fn for_frame(frame: &FrameView<'_>, config: &DetectorConfig) -> Self {
        let minimap = config
            .minimap_size
            .min(frame.width() / 2)
            .min(frame.height() / 2);
        Self {
            center: frame.center(),
            center_radius_sq: config.center_exclusion_radius.powi(2),
            minimap_x: frame.width() - minimap,
            minimap_y: frame.height() - minimap,
        }
    }

    fn skips(&self, x: u32, y: u32) -> bool {
        let in_minimap = x >= self.minimap_x && y >= self.minimap_y;
        in_minimap || Point2D::new(x as f64, y as f64).distance_sq(&self.center) < self.center_radius_sq
    }
}

/// Coarse grid of cells already claimed by an accepted detection.
#[derive(Debug, Default)]
struct OccupancyGrid {
    cells: Vec<bool>,
    cols: usize,
    rows: usize,
    cell: u32,
}

impl OccupancyGrid {
    fn reset(&mut self, width: u32, height: u32, cell: u32) {
        self.cell = cell;
        self.cols = width.div_ceil(cell) as usize;
        self.rows = height.div_ceil(cell) as usize;
        self.cells.clear();
        self.cells.resize(self.cols * self.rows, false);
    }

    fn is_marked(&self, x: u32, y: u32) -> bool {
        let col = (x / self.cell) as usize;
        let row = (y / self.cell) as usize;
        self.cells[row * self.cols + col]
    }

    /// Mark the 3x3 block of cells around the cell containing `p`.
    fn mark_around(&mut self, p: Point2D) {
        let col = (p.x.max(0.0) / self.cell as f64) as i64;
        let row = (p.y.max(0.0) / self.cell as f64) as i64;
        for r in row - 1..=row + 1 {
            for c in col - 1..=col + 1 {
                if r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.cols {
                    self.cells[r as usize * self.cols + c as usize] = true;
                }
            }
        }
    }
}
