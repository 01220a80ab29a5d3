//! Frame buffers and the acquisition contract.
//!
//! Pixels are row-major RGBA, 8 bits per channel. Dimensions may change
//! between ticks; nothing downstream may cache size-derived values.

use tracelock_common::error::{TracelockError, TracelockResult};

use crate::color::Rgb;
use crate::geometry::Point2D;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A borrowed view of one tick's pixel buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
    /// Host timestamp of the frame in milliseconds.
    pub timestamp_ms: u64,
}

impl<'a> FrameView<'a> {
    /// Wrap a buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, data: &'a [u8], timestamp_ms: u64) -> TracelockResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(TracelockError::frame(format!(
                "buffer is {} bytes, expected {expected} for {width}x{height} RGBA",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            timestamp_ms,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Viewport center in image coordinates.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Integer center pixel.
    pub fn center_pixel(&self) -> (i64, i64) {
        ((self.width / 2) as i64, (self.height / 2) as i64)
    }

    /// Whether signed coordinates fall inside the frame.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Pixel color at in-bounds coordinates.
    ///
    /// # Panics
    /// If `(x, y)` is outside the frame.
    pub fn rgb(&self, x: u32, y: u32) -> Rgb {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Rgb::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Pixel color at signed coordinates, `None` when out of bounds.
    pub fn rgb_checked(&self, x: i64, y: i64) -> Option<Rgb> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.rgb(x as u32, y as u32))
    }
}

/// An owned RGBA frame, for tools and tests that synthesize pixels.
///
/// The buffer always matches the dimensions, so `view()` cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    pub timestamp_ms: u64,
}

impl OwnedFrame {
    /// Take ownership of an RGBA buffer, checking its length like [`FrameView::new`].
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> TracelockResult<Self> {
        FrameView::new(width, height, &data, 0)?;
        Ok(Self {
            width,
            height,
            data,
            timestamp_ms: 0,
        })
    }

    /// A frame filled with a single color (alpha 255).
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        Self {
            width,
            height,
            data,
            timestamp_ms: 0,
        }
    }

    /// Set one pixel; out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = 255;
    }

    /// Fill a disc of `radius` around `center`.
    pub fn fill_circle(&mut self, center: Point2D, radius: f64, color: Rgb) {
        let r = radius.ceil() as i64;
        let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
        let r_sq = radius * radius;
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
                if dx * dx + dy * dy <= r_sq {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
            timestamp_ms: self.timestamp_ms,
        }
    }
}

/// Supplies one frame per tick.
pub trait FrameSource {
    /// The current frame, or `None` if no frame is available yet.
    fn acquire(&mut self) -> Option<FrameView<'_>>;
}
