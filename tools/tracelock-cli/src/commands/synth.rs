//! Write a synthetic scenario: a scrolling grid, our own object at the
//! center, and three projectile streams leaving a common source.

use std::path::PathBuf;

use anyhow::Context;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use tracelock_frame_model::color::{ColorClass, Rgb};
use tracelock_frame_model::geometry::Point2D;

const FILL: u8 = 205;
const GRID_PERIOD: i64 = 37;
const PROJECTILE_RADIUS: i32 = 6;
const PROJECTILE_SPEED: f64 = 6.0;
const OWN_RADIUS: i32 = 22;

/// Background luminance at a world position. Line intensity varies so that
/// neighboring grid lines are distinguishable.
fn world_luma(wx: i64, wy: i64) -> u8 {
    let line = |w: i64| {
        (w.rem_euclid(GRID_PERIOD) == 0)
            .then(|| 140 + (w.div_euclid(GRID_PERIOD) * 53).rem_euclid(50) as u8)
    };
    match (line(wx), line(wy)) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => FILL,
    }
}

fn rgba(c: Rgb) -> Rgba<u8> {
    Rgba([c.r, c.g, c.b, 255])
}

pub fn run(
    dir: PathBuf,
    frames: u32,
    width: u32,
    height: u32,
    scroll: (i64, i64),
    own: &str,
) -> anyhow::Result<()> {
    let own: ColorClass = own.parse()?;
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let center = Point2D::new(width as f64 / 2.0, height as f64 / 2.0);
    // World coordinates coincide with screen coordinates on the first frame.
    let source = center + Point2D::new(width as f64 * 0.12, -(height as f64) * 0.15);
    let streams: Vec<(ColorClass, Point2D)> = ColorClass::ALL
        .into_iter()
        .filter(|c| *c != own)
        .zip([-70.0f64, 60.0, 175.0])
        .filter_map(|(c, deg)| {
            let rad = deg.to_radians();
            Point2D::new(rad.cos(), rad.sin()).normalized().map(|d| (c, d))
        })
        .collect();

    for k in 0..frames {
        let view = (scroll.0 * k as i64, scroll.1 * k as i64);
        let offset = Point2D::new(view.0 as f64, view.1 as f64);

        let mut img = RgbaImage::from_fn(width, height, |x, y| {
            let l = world_luma(x as i64 + view.0, y as i64 + view.1);
            Rgba([l, l, l, 255])
        });

        for (color, dir) in &streams {
            let world = source + *dir * (80.0 + PROJECTILE_SPEED * k as f64);
            let screen = world - offset;
            draw_filled_circle_mut(
                &mut img,
                (screen.x.round() as i32, screen.y.round() as i32),
                PROJECTILE_RADIUS,
                rgba(color.fingerprint()),
            );
        }
        draw_filled_circle_mut(
            &mut img,
            (center.x as i32, center.y as i32),
            OWN_RADIUS,
            rgba(own.fingerprint()),
        );

        let path = dir.join(format!("frame_{k:04}.png"));
        img.save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    tracing::info!(
        frames,
        dir = %dir.display(),
        source_x = source.x,
        source_y = source.y,
        own = own.name(),
        "Wrote synthetic scenario"
    );
    println!("Source of the first frame is at ({:.0}, {:.0})", source.x, source.y);
    Ok(())
}
