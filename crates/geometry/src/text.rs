use glam::Vec3;

use crate::font::{self, ADVANCE, GLYPH_COLUMNS, GLYPH_ROWS};
use crate::mesh::Geometry;

/// Extruded block text.
///
/// The baseline starts at the origin and runs along +X; glyphs are `size`
/// units tall and extruded from z = 0 to z = `depth`. Faces between two
/// filled cells are skipped.
pub fn text_geometry(text: &str, size: f32, depth: f32) -> Geometry {
    let cell = size / GLYPH_ROWS as f32;
    let mut g = Geometry::new();

    for (index, c) in text.chars().enumerate() {
        let Some(glyph) = font::glyph(c) else {
            continue;
        };
        let pen = (index * ADVANCE) as f32 * cell;

        for row in 0..GLYPH_ROWS as isize {
            for column in 0..GLYPH_COLUMNS as isize {
                if !font::filled(glyph, column, row) {
                    continue;
                }
                let x0 = pen + column as f32 * cell;
                let y0 = (GLYPH_ROWS as isize - 1 - row) as f32 * cell;
                let (x1, y1) = (x0 + cell, y0 + cell);
                let (across, up, out) = (Vec3::X * cell, Vec3::Y * cell, Vec3::Z * depth);

                g.push_quad(Vec3::new(x0, y0, depth), across, up);
                g.push_quad(Vec3::new(x1, y0, 0.0), -across, up);
                if !font::filled(glyph, column - 1, row) {
                    g.push_quad(Vec3::new(x0, y0, 0.0), out, up);
                }
                if !font::filled(glyph, column + 1, row) {
                    g.push_quad(Vec3::new(x1, y0, depth), -out, up);
                }
                if !font::filled(glyph, column, row - 1) {
                    g.push_quad(Vec3::new(x0, y1, 0.0), out, across);
                }
                if !font::filled(glyph, column, row + 1) {
                    g.push_quad(Vec3::new(x0, y0, 0.0), across, out);
                }
            }
        }
    }
    g
}
