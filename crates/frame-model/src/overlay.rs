//! Overlay draw primitives and the render contract.
//!
//! The pipeline emits a fresh primitive list every tick and keeps no
//! rendering state of its own.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::geometry::Point2D;

/// A single vector drawing instruction in image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawPrimitive {
    /// Connected line segments (trajectory trail, target tether).
    Polyline {
        points: Vec<Point2D>,
        color: Rgb,
        width: f64,
    },

    /// Dashed backward projection of a trajectory.
    DashedRay {
        from: Point2D,
        to: Point2D,
        color: Rgb,
        /// Opacity in [0.0, 1.0].
        alpha: f64,
        /// Dash and gap lengths in pixels.
        dash: [f64; 2],
        width: f64,
    },

    /// Crosshair with a circle, marking the estimated source.
    Marker {
        center: Point2D,
        radius: f64,
        /// Half-length of each crosshair arm.
        arm: f64,
        color: Rgb,
        width: f64,
    },

    /// Text anchored at its baseline start.
    Label {
        position: Point2D,
        text: String,
        color: Rgb,
        size: f64,
    },
}

impl DrawPrimitive {
    /// Short kind name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DrawPrimitive::Polyline { .. } => "polyline",
            DrawPrimitive::DashedRay { .. } => "dashed_ray",
            DrawPrimitive::Marker { .. } => "marker",
            DrawPrimitive::Label { .. } => "label",
        }
    }
}

/// Accepts the primitives produced by one tick.
pub trait OverlayRenderer {
    fn render(&mut self, primitives: &[DrawPrimitive]);
}

/// Renderer that keeps the most recent primitive list.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub last: Vec<DrawPrimitive>,
    pub frames_rendered: u64,
}

impl OverlayRenderer for RecordingRenderer {
    fn render(&mut self, primitives: &[DrawPrimitive]) {
        self.last.clear();
        self.last.extend_from_slice(primitives);
        self.frames_rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_serializes_with_type_tag() {
        let label = DrawPrimitive::Label {
            position: Point2D::new(1.0, 2.0),
            text: "TARGET 10px".to_string(),
            color: Rgb::new(255, 0, 0),
            size: 20.0,
        };
        let json = serde_json::to_value(&label).unwrap();
        assert_eq!(json["type"], "label");
        assert_eq!(json["text"], "TARGET 10px");
        assert_eq!(label.kind(), "label");
    }

    #[test]
    fn test_recording_renderer_replaces_previous_tick() {
        let mut renderer = RecordingRenderer::default();
        let line = DrawPrimitive::Polyline {
            points: vec![Point2D::ZERO, Point2D::new(1.0, 1.0)],
            color: Rgb::new(0, 0, 0),
            width: 1.5,
        };
        renderer.render(&[line.clone(), line]);
        renderer.render(&[]);
        assert!(renderer.last.is_empty());
        assert_eq!(renderer.frames_rendered, 2);
    }
}
