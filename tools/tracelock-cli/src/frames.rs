//! PNG frame sequences as a frame source.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracelock_common::clock::SessionClock;
use tracelock_frame_model::frame::{FrameSource, FrameView, OwnedFrame};

/// Decode a PNG (or any format `image` knows) into an RGBA frame.
pub fn load_frame(path: &Path) -> anyhow::Result<OwnedFrame> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    OwnedFrame::from_rgba(width, height, img.into_raw())
        .with_context(|| format!("Unexpected pixel layout in {}", path.display()))
}

/// `*.png` files in `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Frames loaded lazily from disk, one per tick, with synthesized timestamps.
pub struct PngSequence {
    paths: Vec<PathBuf>,
    next: usize,
    frame_interval_ms: u64,
    current: Option<(PathBuf, OwnedFrame)>,
    failed: usize,
}

impl PngSequence {
    pub fn new(paths: Vec<PathBuf>, frame_interval_ms: u64) -> Self {
        Self {
            paths,
            next: 0,
            frame_interval_ms,
            current: None,
            failed: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.paths.len()
    }

    /// The frame handed out by the last `acquire`.
    pub fn current(&self) -> Option<(&Path, &OwnedFrame)> {
        self.current.as_ref().map(|(p, f)| (p.as_path(), f))
    }

    /// Files that could not be decoded.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl FrameSource for PngSequence {
    fn acquire(&mut self) -> Option<FrameView<'_>> {
        self.current = None;
        let index = self.next;
        let path = self.paths.get(index)?.clone();
        self.next += 1;

        match load_frame(&path) {
            Ok(mut frame) => {
                frame.timestamp_ms =
                    SessionClock::frame_timestamp_ms(index as u64, self.frame_interval_ms);
                self.current = Some((path, frame));
            }
            Err(e) => {
                self.failed += 1;
                tracing::warn!(error = %e, "Skipping unreadable frame");
                return None;
            }
        }
        self.current.as_ref().map(|(_, f)| f.view())
    }
}
