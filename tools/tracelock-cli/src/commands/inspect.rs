//! Show identity counts and detections for a single frame.

use std::path::PathBuf;

use tracelock_frame_model::color::ColorClass;
use tracelock_processing_core::identity::{classify, count_samples};
use tracelock_processing_core::{BlobDetector, TrackerConfig};

use crate::frames::load_frame;

pub fn run(path: PathBuf, config: TrackerConfig) -> anyhow::Result<()> {
    let frame = load_frame(&path)?;
    let view = frame.view();

    println!("Frame: {}", path.display());
    println!("  Size: {}x{}", view.width(), view.height());
    println!();

    let counts = count_samples(&view, &config.identity);
    let own = classify(&view, &config.identity);
    println!("Identity (center samples):");
    for class in ColorClass::ALL {
        println!("  {:<7} {}", class.name(), counts[class.index()]);
    }
    match own {
        Some(c) => println!("  Own color: {c}"),
        None => println!("  Own color: undetermined"),
    }
    println!();

    let mut detector = BlobDetector::new();
    let detections = detector.detect(&view, own, &config.detector);
    println!("Detections: {}", detections.len());
    for d in detections {
        println!(
            "  {:<7} ({:.1}, {:.1})",
            d.color.name(),
            d.position.x,
            d.position.y
        );
    }

    Ok(())
}
