//! Clock and timing utilities for the tick loop.
//!
//! The pipeline never reads the system clock itself. Every frame carries a
//! millisecond timestamp supplied by its source, and periodic work is gated
//! against those timestamps. This module provides:
//! - An elapsed-time gate for work that runs on an interval, not every tick
//! - A session clock that stamps live frames relative to session start

use std::time::Instant;

/// Elapsed-time gate for periodic work driven by frame timestamps.
///
/// The gate opens on the first call, then again only once strictly more than
/// the interval has passed since the last time it opened.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    interval_ms: u64,
    last_open_ms: Option<u64>,
}

impl IntervalGate {
    /// Create a gate that opens at most once per `interval_ms`.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_open_ms: None,
        }
    }

    /// Check whether the gate opens at `now_ms`.
    /// Returns true and records `now_ms` if it does.
    pub fn should_open(&mut self, now_ms: u64) -> bool {
        match self.last_open_ms {
            None => {
                self.last_open_ms = Some(now_ms);
                true
            }
            Some(last) if now_ms.saturating_sub(last) > self.interval_ms => {
                self.last_open_ms = Some(now_ms);
                true
            }
            // A timestamp going backwards means the source restarted.
            Some(last) if now_ms < last => {
                self.last_open_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Forget the last opening so the next check opens immediately.
    pub fn reset(&mut self) {
        self.last_open_ms = None;
    }

    /// Timestamp of the last opening, if any.
    pub fn last_open_ms(&self) -> Option<u64> {
        self.last_open_ms
    }

    /// Configured interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

/// A session clock that provides monotonic millisecond timestamps relative
/// to a fixed epoch (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since session start.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Synthetic timestamp for the `index`-th frame of a fixed-rate sequence.
    pub fn frame_timestamp_ms(index: u64, frame_interval_ms: u64) -> u64 {
        index.saturating_mul(frame_interval_ms)
    }
}
