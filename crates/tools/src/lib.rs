//! Developer tooling: read-only scene inspection for the CLI and the
//! desktop HUD.
//!
//! # Invariants
//! - Tools never mutate the scene graph.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
