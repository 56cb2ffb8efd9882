//! Geometry generators.
//!
//! Every generator produces an indexed triangle list with per-vertex
//! normals and texture coordinates. Triangles wind counter-clockwise when
//! seen from the side the normal points to.

mod font;
mod mesh;
mod primitives;
mod text;

pub use mesh::{Geometry, Vertex};
pub use primitives::{box_geometry, plane_geometry, torus_knot_geometry};
pub use text::text_geometry;
