use std::f32::consts::TAU;

use glam::Vec3;

use crate::mesh::Geometry;

/// Axis-aligned box centred on the origin, one quad per face.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> Geometry {
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut g = Geometry::new();

    #[rustfmt::skip]
    let faces = [
        // +Z
        (Vec3::new(-hx, -hy,  hz), Vec3::X * width,  Vec3::Y * height),
        // -Z
        (Vec3::new( hx, -hy, -hz), Vec3::NEG_X * width, Vec3::Y * height),
        // +X
        (Vec3::new( hx, -hy,  hz), Vec3::NEG_Z * depth, Vec3::Y * height),
        // -X
        (Vec3::new(-hx, -hy, -hz), Vec3::Z * depth,  Vec3::Y * height),
        // +Y
        (Vec3::new(-hx,  hy,  hz), Vec3::X * width,  Vec3::NEG_Z * depth),
        // -Y
        (Vec3::new(-hx, -hy, -hz), Vec3::X * width,  Vec3::Z * depth),
    ];
    for (origin, u, v) in faces {
        g.push_quad(origin, u, v);
    }
    g
}

/// Plane in the XY plane facing +Z, subdivided into a grid.
///
/// Vertex rows run top to bottom; `uv` has (0, 1) at the top-left corner.
pub fn plane_geometry(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> Geometry {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let seg_w = width / grid_x as f32;
    let seg_h = height / grid_y as f32;
    let mut g = Geometry::new();

    for iy in 0..=grid_y {
        let y = height * 0.5 - iy as f32 * seg_h;
        for ix in 0..=grid_x {
            let x = ix as f32 * seg_w - width * 0.5;
            g.push_vertex(
                Vec3::new(x, y, 0.0),
                Vec3::Z,
                [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
            );
        }
    }

    let row = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = ix + 1 + row * (iy + 1);
            let d = ix + 1 + row * iy;
            g.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    g
}

/// Point on the (p, q) torus-knot curve at parameter `u`.
fn knot_curve(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * qu_over_p.sin() * 0.5,
    )
}

/// Tube swept along a (p, q) torus knot.
///
/// `tubular_segments` subdivide the curve, `radial_segments` the tube cross
/// section. Seams are duplicated so uv runs 0..1 in both directions.
pub fn torus_knot_geometry(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> Geometry {
    let tubular = tubular_segments.max(3);
    let radial = radial_segments.max(3);
    let (p, q) = (p.max(1) as f32, q as f32);
    let mut g = Geometry::new();

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p * TAU;
        let p1 = knot_curve(u, p, q, radius);
        let p2 = knot_curve(u + 0.01, p, q, radius);

        // Frame along the curve: tangent, then binormal and normal from it.
        let tangent = p2 - p1;
        let mut normal = p2 + p1;
        let binormal = tangent.cross(normal);
        normal = binormal.cross(tangent);
        let binormal = binormal.normalize();
        let normal = normal.normalize();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let position = p1 + normal * cx + binormal * cy;
            g.push_vertex(
                position,
                (position - p1).normalize(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            );
        }
    }

    let row = radial + 1;
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = row * (j - 1) + (i - 1);
            let b = row * j + (i - 1);
            let c = row * j + i;
            let d = row * (j - 1) + i;
            g.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_four_vertices_per_face() {
        let g = box_geometry(10.0, 10.0, 10.0);
        assert_eq!(g.vertex_count(), 24);
        assert_eq!(g.index_count(), 36);
        let (min, max) = g.bounds();
        assert_eq!(min, Vec3::splat(-5.0));
        assert_eq!(max, Vec3::splat(5.0));
    }

    #[test]
    fn box_normals_point_outward() {
        let g = box_geometry(2.0, 4.0, 6.0);
        for v in &g.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!(p.dot(n) > 0.0, "normal {n:?} at {p:?} points inward");
        }
    }

    #[test]
    fn plane_grid_counts() {
        let g = plane_geometry(100.0, 100.0, 10, 10);
        assert_eq!(g.vertex_count(), 121);
        assert_eq!(g.triangle_count(), 200);
        let (min, max) = g.bounds();
        assert_eq!(min, Vec3::new(-50.0, -50.0, 0.0));
        assert_eq!(max, Vec3::new(50.0, 50.0, 0.0));
    }

    #[test]
    fn plane_faces_positive_z() {
        let g = plane_geometry(4.0, 4.0, 2, 2);
        let p = |i: u32| Vec3::from(g.vertices[i as usize].position);
        for tri in g.indices.chunks(3) {
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn plane_uv_top_left_is_zero_one() {
        let g = plane_geometry(1.0, 1.0, 1, 1);
        assert_eq!(g.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(g.vertices[0].position, [-0.5, 0.5, 0.0]);
    }

    #[test]
    fn torus_knot_counts() {
        let g = torus_knot_geometry(10.0, 2.0, 64, 64, 1, 3);
        assert_eq!(g.vertex_count(), 65 * 65);
        assert_eq!(g.index_count(), 64 * 64 * 6);
        assert!(g.indices.iter().all(|&i| (i as usize) < g.vertex_count()));
    }

    #[test]
    fn torus_knot_stays_within_radius() {
        let g = torus_knot_geometry(10.0, 2.0, 32, 16, 1, 3);
        for v in &g.vertices {
            let p = Vec3::from(v.position);
            assert!(p.length() <= 10.0 * 1.5 + 2.0 + 1e-3);
            assert!(!p.is_nan());
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-4);
        }
    }
}
