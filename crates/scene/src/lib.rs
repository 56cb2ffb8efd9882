//! Scene graph: the node hierarchy that renderers draw.
//!
//! # Invariants
//! - Node ids are allocated sequentially; iteration follows insertion order.
//! - A node is drawn only if it and all of its ancestors are visible.
//! - Cameras carry their own pose; a camera node's transform is not used.

pub mod camera;
pub mod graph;
pub mod node;
pub mod target;

pub use camera::{PerspectiveCamera, look_rotation};
pub use graph::{Fog, SceneError, SceneGraph};
pub use node::{Material, Mesh, Node, NodeKind, ShadowSettings, SpotLight};
pub use target::{RenderTargetDesc, RenderTargetId, TextureFormat};
