//! Tracelock Frame Model
//!
//! Defines the data contracts shared by the pipeline and its collaborators:
//! - **Color classes:** the fixed fingerprint table tracked objects are matched against
//! - **Frames:** borrowed RGBA pixel buffers and the `FrameSource` contract
//! - **Geometry:** image-space points and vector helpers
//! - **Overlay:** draw primitives and the `OverlayRenderer` contract
//!
//! All coordinates are in image pixels, origin at the top-left, y down.

pub mod color;
pub mod frame;
pub mod geometry;
pub mod overlay;

pub use color::*;
pub use frame::*;
pub use geometry::*;
pub use overlay::*;
