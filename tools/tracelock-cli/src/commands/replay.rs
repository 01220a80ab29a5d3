//! Replay a PNG frame sequence through the tracker.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracelock_common::clock::SessionClock;
use tracelock_frame_model::color::ColorClass;
use tracelock_frame_model::overlay::{DrawPrimitive, OverlayRenderer, RecordingRenderer};
use tracelock_processing_core::background::ShiftEstimate;
use tracelock_processing_core::{TargetEstimate, TickDriver, TrackerConfig};

use crate::annotate::ImageRenderer;
use crate::frames::{list_frames, PngSequence};

/// One JSON line per processed tick.
#[derive(Serialize)]
struct TickRecord<'a> {
    frame: String,
    timestamp_ms: u64,
    own_color: Option<ColorClass>,
    shift: ShiftEstimate,
    detections: usize,
    trajectories: usize,
    target: Option<TargetEstimate>,
    primitives: &'a [DrawPrimitive],
}

pub fn run(
    dir: PathBuf,
    output: Option<PathBuf>,
    annotate: Option<PathBuf>,
    frame_interval_ms: u64,
    annotate_rays: bool,
    config: TrackerConfig,
) -> anyhow::Result<()> {
    let paths = list_frames(&dir)?;
    if paths.is_empty() {
        anyhow::bail!("No PNG frames found in {}", dir.display());
    }
    let clock = SessionClock::start();
    tracing::info!(
        frames = paths.len(),
        dir = %dir.display(),
        started = clock.epoch_wall(),
        "Replaying frame sequence"
    );

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    if let Some(dir) = &annotate {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let source = PngSequence::new(paths, frame_interval_ms);
    let mut driver = TickDriver::new(source, RecordingRenderer::default(), config);
    let mut annotator = ImageRenderer::new(annotate_rays);
    let mut ticks = 0usize;
    let mut locked = 0usize;

    while !driver.source().is_exhausted() {
        if !driver.run_tick() {
            continue;
        }
        let (Some(tick), Some((path, frame))) = (driver.last_output(), driver.source().current())
        else {
            continue;
        };
        ticks += 1;
        locked += usize::from(tick.target.is_some());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = TickRecord {
            frame: name.clone(),
            timestamp_ms: frame.timestamp_ms,
            own_color: tick.own_color,
            shift: tick.shift,
            detections: tick.detections,
            trajectories: tick.trajectories,
            target: tick.target,
            primitives: &tick.primitives,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;

        if let Some(dir) = &annotate {
            annotator.begin(frame)?;
            annotator.render(&tick.primitives);
            if let Some(img) = annotator.finish() {
                let dest = dir.join(&name);
                img.save(&dest)
                    .with_context(|| format!("Failed to write {}", dest.display()))?;
            }
        }
    }
    out.flush()?;

    let (source, _, context) = driver.into_parts();
    tracing::info!(
        ticks,
        locked,
        skipped = source.failed(),
        own_color = context.own_color().map(ColorClass::name),
        elapsed_ms = clock.elapsed_ms(),
        "Replay finished"
    );
    Ok(())
}
