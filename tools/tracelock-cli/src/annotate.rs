//! Rasterizes draw primitives onto a copy of a frame.

use anyhow::Context;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, Blend};
use tracelock_frame_model::color::Rgb;
use tracelock_frame_model::frame::OwnedFrame;
use tracelock_frame_model::geometry::Point2D;
use tracelock_frame_model::overlay::{DrawPrimitive, OverlayRenderer};

/// Renderer that draws every tick onto its frame and keeps the image.
///
/// Labels are skipped: no font ships with the tool.
pub struct ImageRenderer {
    canvas: Option<Blend<RgbaImage>>,
    include_rays: bool,
}

impl ImageRenderer {
    pub fn new(include_rays: bool) -> Self {
        Self {
            canvas: None,
            include_rays,
        }
    }

    /// Start a new canvas from `frame`.
    pub fn begin(&mut self, frame: &OwnedFrame) -> anyhow::Result<()> {
        let img = RgbaImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .context("Frame buffer does not match its dimensions")?;
        self.canvas = Some(Blend(img));
        Ok(())
    }

    /// Take the finished image, if a canvas was started.
    pub fn finish(&mut self) -> Option<RgbaImage> {
        self.canvas.take().map(|c| c.0)
    }
}

impl OverlayRenderer for ImageRenderer {
    fn render(&mut self, primitives: &[DrawPrimitive]) {
        let include_rays = self.include_rays;
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        for primitive in primitives {
            match primitive {
                DrawPrimitive::Polyline {
                    points,
                    color,
                    width,
                } => {
                    for pair in points.windows(2) {
                        thick_line(canvas, pair[0], pair[1], rgba(*color, 1.0), *width);
                    }
                }
                DrawPrimitive::DashedRay {
                    from,
                    to,
                    color,
                    alpha,
                    dash,
                    width,
                } if include_rays => {
                    dashed_line(canvas, *from, *to, rgba(*color, *alpha), *dash, *width)
                }
                DrawPrimitive::DashedRay { .. } => {}
                DrawPrimitive::Marker {
                    center,
                    radius,
                    arm,
                    color,
                    width,
                } => {
                    let c = rgba(*color, 1.0);
                    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
                    let r = radius.round() as i32;
                    let half = (width / 2.0).floor() as i32;
                    for dr in -half..=half {
                        draw_hollow_circle_mut(canvas, (cx, cy), (r + dr).max(1), c);
                    }
                    let (h, v) = (Point2D::new(*arm, 0.0), Point2D::new(0.0, *arm));
                    thick_line(canvas, *center - h, *center + h, c, *width);
                    thick_line(canvas, *center - v, *center + v, c, *width);
                }
                DrawPrimitive::Label { text, .. } => {
                    tracing::trace!(text = %text, "Label not rasterized");
                }
            }
        }
    }
}

fn rgba(color: Rgb, alpha: f64) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// A line drawn as parallel one-pixel segments.
fn thick_line(canvas: &mut Blend<RgbaImage>, a: Point2D, b: Point2D, color: Rgba<u8>, width: f64) {
    let normal = Point2D::new(a.y - b.y, b.x - a.x).normalized().unwrap_or(Point2D::ZERO);
    let passes = width.round().max(1.0) as i32;
    for i in 0..passes {
        let off = normal * (i as f64 - (passes - 1) as f64 / 2.0);
        let (s, e) = (a + off, b + off);
        draw_line_segment_mut(canvas, (s.x as f32, s.y as f32), (e.x as f32, e.y as f32), color);
    }
}

fn dashed_line(
    canvas: &mut Blend<RgbaImage>,
    from: Point2D,
    to: Point2D,
    color: Rgba<u8>,
    dash: [f64; 2],
    width: f64,
) {
    let length = from.distance_to(&to);
    let Some(dir) = (to - from).normalized() else {
        return;
    };
    let period = dash[0] + dash[1];
    if dash[0] <= 0.0 || period <= 0.0 {
        thick_line(canvas, from, to, color, width);
        return;
    }
    let mut t = 0.0;
    while t < length {
        let end = (t + dash[0]).min(length);
        thick_line(canvas, from + dir * t, from + dir * end, color, width);
        t += period;
    }
}
