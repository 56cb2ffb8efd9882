//! Shared value types used across the mirrorlight workspace.

mod types;

pub use types::{Color, NodeId, Transform};
