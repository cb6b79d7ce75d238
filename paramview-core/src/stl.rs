//! STL model loader for binary and ASCII files

use std::path::Path;

use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, multispace1},
    combinator::opt,
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use tracing::debug;

use crate::error::LoadError;
use crate::geometry::{Mesh, Surface, Triangle, Vertex};
use crate::loader::ModelLoader;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Reads binary or ASCII STL, sniffing the format from the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlLoader;

impl ModelLoader for StlLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["stl"]
    }

    fn parse(&self, bytes: &[u8], base_path: Option<&Path>) -> Result<Surface, LoadError> {
        let mesh = parse_stl(bytes)?;
        // Facets that collapse to a line or point carry no shading information.
        let total = mesh.len();
        let mesh = Mesh {
            triangles: mesh
                .triangles
                .into_iter()
                .filter(|t| !t.is_degenerate())
                .collect(),
        };
        if mesh.is_empty() {
            return Err(LoadError::Empty);
        }
        debug!(
            source = ?base_path,
            triangles = mesh.len(),
            dropped = total - mesh.len(),
            "parsed STL"
        );
        Ok(Surface::new(mesh))
    }
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LoadError::TooSmall(data.len()));
    }

    // Skip 80-byte header
    let data = &data[HEADER_LEN..];
    let triangle_count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

    // Never trust the declared count for the allocation.
    let available = (data.len() - 4) / FACET_LEN;
    let mut mesh = Mesh::with_capacity(triangle_count.min(available));
    let mut offset = 4;

    for parsed in 0..triangle_count {
        if offset + FACET_LEN > data.len() {
            return Err(LoadError::Truncated {
                parsed,
                expected: triangle_count,
            });
        }

        let normal = [
            read_f32(data, offset),
            read_f32(data, offset + 4),
            read_f32(data, offset + 8),
        ];
        offset += 12;

        let mut vertices = [Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0); 3];
        for vertex in &mut vertices {
            *vertex = Vertex::new(
                read_f32(data, offset),
                read_f32(data, offset + 4),
                read_f32(data, offset + 8),
                normal[0],
                normal[1],
                normal[2],
            );
            offset += 12;
        }

        // Skip attribute byte count
        offset += 2;

        mesh.add_triangle(with_face_normal(Triangle::new(
            vertices[0],
            vertices[1],
            vertices[2],
        )));
    }

    Ok(mesh)
}

/// Many exporters write zero normals; derive one from the winding instead.
fn with_face_normal(mut triangle: Triangle) -> Triangle {
    let stored = triangle.vertices[0].normal;
    if stored.norm_squared() > 0.0 || triangle.is_degenerate() {
        return triangle;
    }
    let normal = triangle.calculate_normal();
    for vertex in &mut triangle.vertices {
        vertex.normal = normal;
    }
    triangle
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, LoadError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(LoadError::Malformed(format!("ASCII STL: {e}"))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional name up to the end of the line
    let (input, _) = take_till(|c| c == '\n')(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(take_till(|c| c == '\n'))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(with_face_normal(triangle));
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Vertex::new(x, y, z, normal.0, normal.1, normal.2)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    // Binary files may also start with "solid"; fall back when ASCII fails.
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(err) if data.len() < HEADER_LEN + 4 => return Err(err),
                Err(err) => debug!(%err, "not ASCII STL, trying binary"),
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRA_FACE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 0
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tri
";

    fn binary(triangles: &[[[f32; 3]; 3]], declared: u32) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&declared.to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for vertex in triangle {
                for c in vertex {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let data = binary(&[], 0);
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_parse_ascii() {
        let mesh = parse_stl(TETRA_FACE.as_bytes()).unwrap();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.triangles[1].vertices[2].position.z, 1.0);
        // zero normal replaced by the winding normal
        assert!((mesh.triangles[1].vertices[0].normal.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_binary_triangle() {
        let data = binary(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]], 1);
        let surface = StlLoader.parse(&data, None).unwrap();
        assert_eq!(surface.triangle_count(), 1);
        assert_eq!(surface.wireframe.len(), 3);
        assert!((surface.mesh.triangles[0].vertices[0].normal.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(
            StlLoader.parse(b"garbage", None),
            Err(LoadError::TooSmall(7))
        ));
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]], 3);
        data.truncate(data.len() - 10);
        assert!(matches!(
            parse_binary_stl(&data),
            Err(LoadError::Truncated {
                parsed: 0,
                expected: 3
            })
        ));
    }

    #[test]
    fn test_malformed_short_ascii() {
        assert!(matches!(
            parse_stl(b"solid x\n facet nope"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_no_drawable_triangles() {
        let data = binary(&[[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]], 1);
        assert!(matches!(StlLoader.parse(&data, None), Err(LoadError::Empty)));
        assert!(matches!(
            StlLoader.parse(&binary(&[], 0), None),
            Err(LoadError::Empty)
        ));
    }
}
