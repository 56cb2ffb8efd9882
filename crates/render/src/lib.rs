//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Backends read the scene graph; they never mutate it.
//! - One `render` call draws the scene once into one target.
//!
//! The GPU implementation lives in `mirrorlight-render-wgpu`. The
//! [`RecordingBackend`] here records each pass instead of drawing, which is
//! what tests and the headless CLI run against.

mod backend;
mod recording;

pub use backend::{RenderBackend, RenderError, RenderTarget};
pub use recording::{PassRecord, RecordingBackend};
