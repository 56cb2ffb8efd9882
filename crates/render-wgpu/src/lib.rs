//! wgpu render backend for mirrorlight scenes.
//!
//! Each `render` call records one command buffer: a depth pass per
//! shadow-casting spotlight, then a colour pass that draws opaque meshes
//! followed by transparent ones. Colour passes are multisampled and resolve
//! into the surface texture or the offscreen target's texture. Offscreen
//! targets are created on first use and can be sampled by basic materials
//! in later passes.
//!
//! # Invariants
//! - The backend never mutates the scene graph.
//! - A mesh never samples the target it is being drawn into.
//! - Screen frames are presented explicitly by the host, after any overlay.

mod context;
mod draws;
mod gpu;
mod resources;
mod shaders;
mod uniforms;

pub use context::GpuContext;
pub use gpu::WgpuBackend;
