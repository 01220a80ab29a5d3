//! Tracelock Processing Core: The Tracker
//!
//! Turns a stream of RGBA frames into trajectories and a source estimate:
//! - **Identity:** Learn which color class is our own and ignore it
//! - **Background Shift:** Measure scene scrolling and re-anchor stored history
//! - **Blob Detection:** Sparse fingerprint scan with local centroid refinement
//! - **Tracks:** Greedy per-color association with one-tick termination
//! - **Motion:** Least-squares velocity and linearity per trajectory
//! - **Triangulation:** Intersect backward rays and pick the densest cluster
//!
//! This crate is pure computation with no I/O and no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod background;
pub mod blob_detect;
pub mod config;
pub mod identity;
pub mod motion;
pub mod overlay;
pub mod pipeline;
pub mod track;
pub mod triangulate;

pub use background::BackgroundAnchor;
pub use blob_detect::BlobDetector;
pub use config::TrackerConfig;
pub use pipeline::{process_tick, TickDriver, TickOutput, TrackerContext};
pub use track::TrackManager;
pub use triangulate::TargetEstimate;
