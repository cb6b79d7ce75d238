//! Block lettering built from a 5x7 bitmap font, one cuboid per pixel run

use nalgebra::{Point3, Vector3};

use super::box_geometry::cuboid;
use super::{finish, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character, in pixels.
const ADVANCE: u32 = GLYPH_WIDTH + 1;
const MAX_CHARS: usize = 32;

const BLANK: [u8; 7] = [0; 7];

/// Rows top to bottom; bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        _ => BLANK,
    }
}

/// Horizontal runs of lit pixels in a glyph row as `(start, length)`.
fn runs(row: u8) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut start = None;
    for col in 0..=GLYPH_WIDTH {
        let lit = col < GLYPH_WIDTH && row & (1 << (GLYPH_WIDTH - 1 - col)) != 0;
        match (lit, start) {
            (true, None) => start = Some(col),
            (false, Some(s)) => {
                out.push((s, col - s));
                start = None;
            }
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextFactory;

impl GeometryFactory for TextFactory {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn schema(&self) -> ParameterRecord {
        ParameterRecord::new()
            .text("text", "HELLO")
            .number("size", 0.5, 0.1, 2.0, 0.05)
            .number("depth", 0.1, 0.01, 1.0, 0.01)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let text = params.get_text("text")?;
        let size = params.get_number("size")?;
        let depth = params.get_number("depth")?;

        let chars: Vec<char> = text.chars().collect();
        if chars.len() > MAX_CHARS {
            return Err(GeometryError::invalid(
                "text",
                format!("at most {MAX_CHARS} characters, got {}", chars.len()),
            ));
        }

        let pixel = size / GLYPH_HEIGHT as f32;
        let total_width = (chars.len() as u32 * ADVANCE).saturating_sub(1) as f32 * pixel;
        let left = -total_width / 2.0;
        let top = size / 2.0;

        let mut builder = MeshBuilder::new();
        for (index, c) in chars.iter().enumerate() {
            let origin = left + (index as u32 * ADVANCE) as f32 * pixel;
            for (row, bits) in glyph(*c).iter().enumerate() {
                for (start, len) in runs(*bits) {
                    let center = Point3::new(
                        origin + (start as f32 + len as f32 / 2.0) * pixel,
                        top - (row as f32 + 0.5) * pixel,
                        0.0,
                    );
                    let extent = Vector3::new(len as f32 * pixel, pixel, depth);
                    cuboid(&mut builder, center, extent, [1, 1, 1]);
                }
            }
        }

        if builder.vertex_count() == 0 {
            return Err(GeometryError::invalid("text", "no printable characters"));
        }
        finish(builder, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamInput;

    fn build(text: &str) -> Result<Surface, GeometryError> {
        let mut params = TextFactory.schema();
        params.set("text", ParamInput::Text(text.to_string())).unwrap();
        TextFactory.build(&params)
    }

    #[test]
    fn test_runs() {
        assert_eq!(runs(0x1F), vec![(0, 5)]);
        assert_eq!(runs(0x11), vec![(0, 1), (4, 1)]);
        assert_eq!(runs(0x15), vec![(0, 1), (2, 1), (4, 1)]);
        assert!(runs(0x00).is_empty());
    }

    #[test]
    fn test_single_bar() {
        // '-' is one run: a single cuboid
        let surface = build("-").unwrap();
        assert_eq!(surface.triangle_count(), 12);
        let (lo, hi) = surface.mesh.bounds().unwrap();
        assert!((hi.x - lo.x - 0.5 * 5.0 / 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        assert_eq!(build("abc").unwrap(), build("ABC").unwrap());
    }

    #[test]
    fn test_blank_text_is_invalid() {
        assert!(matches!(build("   "), Err(GeometryError::InvalidParameter { .. })));
        assert!(matches!(build(""), Err(GeometryError::InvalidParameter { .. })));
    }

    #[test]
    fn test_text_length_limit() {
        assert!(build(&"A".repeat(MAX_CHARS)).is_ok());
        assert!(build(&"A".repeat(MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn test_text_is_centered() {
        let (lo, hi) = build("HH").unwrap().mesh.bounds().unwrap();
        assert!((lo.x + hi.x).abs() < 1e-5);
        assert!((lo.y + hi.y).abs() < 1e-5);
    }
}
