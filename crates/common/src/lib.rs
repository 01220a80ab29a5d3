//! Tracelock Common Utilities
//!
//! Shared infrastructure for all Tracelock crates:
//! - Error types and result aliases
//! - Interval gating and session clock utilities
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
