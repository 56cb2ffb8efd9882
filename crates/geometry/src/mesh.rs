use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`. An empty mesh yields zeros.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let Some(first) = iter.next() else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)))
    }

    pub(crate) fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        });
        index
    }

    /// Push the quad `origin, origin+u, origin+u+v, origin+v`.
    ///
    /// The face normal is `u × v`; the quad is front-facing from that side.
    pub(crate) fn push_quad(&mut self, origin: Vec3, u: Vec3, v: Vec3) {
        let normal = u.cross(v).normalize_or_zero();
        let a = self.push_vertex(origin, normal, [0.0, 0.0]);
        let b = self.push_vertex(origin + u, normal, [1.0, 0.0]);
        let c = self.push_vertex(origin + u + v, normal, [1.0, 1.0]);
        let d = self.push_vertex(origin + v, normal, [0.0, 1.0]);
        self.indices.extend_from_slice(&[a, b, c, c, d, a]);
    }
}
