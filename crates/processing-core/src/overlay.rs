//! Builds the per-tick overlay primitive list.

use tracelock_frame_model::geometry::Point2D;
use tracelock_frame_model::overlay::DrawPrimitive;

use crate::config::{MotionConfig, OverlayConfig};
use crate::track::Trajectory;
use crate::triangulate::TargetEstimate;

/// Append trails, backward rays and the target lock to `out`.
///
/// `center` is the viewport center the distance label is measured from.
pub fn emit_primitives(
    out: &mut Vec<DrawPrimitive>,
    trajectories: &[Trajectory],
    target: Option<&TargetEstimate>,
    center: Point2D,
    motion: &MotionConfig,
    config: &OverlayConfig,
) {
    for t in trajectories {
        let history = t.history();
        if history.len() < 2 {
            continue;
        }
        let color = t.color().display();

        out.push(DrawPrimitive::Polyline {
            points: history.tail(config.trail_length.max(2)).copied().collect(),
            color,
            width: config.line_width,
        });

        let Some(back) = t
            .motion()
            .filter(|m| m.is_reliable(motion))
            .and_then(|m| m.backward_direction())
        else {
            continue;
        };
        let head = t.position();
        out.push(DrawPrimitive::DashedRay {
            from: head,
            to: head + back * config.ray_length,
            color,
            alpha: config.ray_alpha,
            dash: config.ray_dash,
            width: config.line_width,
        });
    }

    if let Some(target) = target {
        emit_target(out, target.position, center, config);
    }
}

fn emit_target(out: &mut Vec<DrawPrimitive>, position: Point2D, center: Point2D, config: &OverlayConfig) {
    let color = config.target_color;
    out.push(DrawPrimitive::Polyline {
        points: vec![center, position],
        color,
        width: config.tether_width,
    });
    out.push(DrawPrimitive::Marker {
        center: position,
        radius: config.marker_radius,
        arm: config.marker_arm,
        color,
        width: config.marker_width,
    });
    out.push(DrawPrimitive::Label {
        position: position + Point2D::new(config.label_offset, -config.label_offset),
        text: distance_label(position, center),
        color,
        size: config.label_size,
    });
}

/// `TARGET {d}px` with the distance truncated to whole pixels.
pub fn distance_label(position: Point2D, center: Point2D) -> String {
    format!("TARGET {}px", position.distance_to(&center).floor() as u64)
}
