//! Star outline extruded along Z, with an optional rounded bevel

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::{Point3, Vector2, Vector3};

use super::{finish, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtrudeFactory;

/// Alternating outer/inner star points, starting at the top.
fn star(points: u32, inner: f32, outer: f32) -> Vec<Vector2<f32>> {
    (0..points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = FRAC_PI_2 + i as f32 * PI / points as f32;
            Vector2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// One ring of the extrusion: outline grown by `offset`, placed at `z`.
#[derive(Debug, Clone, Copy)]
struct Section {
    offset: f32,
    z: f32,
}

fn sections(
    steps: u32,
    depth: f32,
    bevel: Option<(f32, f32, u32)>,
) -> Vec<Section> {
    let mut out = Vec::new();
    let body_offset = bevel.map_or(0.0, |(_, size, _)| size);

    if let Some((thickness, size, segments)) = bevel {
        for s in 0..segments {
            let t = s as f32 / segments as f32 * FRAC_PI_2;
            out.push(Section {
                offset: size * t.sin(),
                z: -thickness * t.cos(),
            });
        }
    }
    for k in 0..=steps {
        out.push(Section {
            offset: body_offset,
            z: depth * k as f32 / steps as f32,
        });
    }
    if let Some((thickness, size, segments)) = bevel {
        for s in (0..segments).rev() {
            let t = s as f32 / segments as f32 * FRAC_PI_2;
            out.push(Section {
                offset: size * t.sin(),
                z: depth + thickness * t.cos(),
            });
        }
    }
    out
}

fn grow(p: Vector2<f32>, offset: f32) -> Vector2<f32> {
    let norm = p.norm();
    if norm == 0.0 {
        p
    } else {
        p * ((norm + offset) / norm)
    }
}

impl GeometryFactory for ExtrudeFactory {
    fn kind(&self) -> &'static str {
        "extrude"
    }

    fn schema(&self) -> ParameterRecord {
        ParameterRecord::new()
            .count("points", 5, 3, 12)
            .number("innerRadius", 0.5, 0.1, 2.0, 0.05)
            .number("outerRadius", 1.0, 0.2, 3.0, 0.05)
            .count("steps", 1, 1, 10)
            .number("depth", 0.4, 0.05, 5.0, 0.05)
            .boolean("bevelEnabled", true)
            .number("bevelThickness", 0.1, 0.0, 1.0, 0.01)
            .number("bevelSize", 0.1, 0.0, 1.0, 0.01)
            .count("bevelSegments", 3, 1, 8)
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let points = params.get_count("points")?;
        let inner = params.get_number("innerRadius")?;
        let outer = params.get_number("outerRadius")?;
        let steps = params.get_count("steps")?;
        let depth = params.get_number("depth")?;
        let bevel = if params.get_bool("bevelEnabled")? {
            Some((
                params.get_number("bevelThickness")?,
                params.get_number("bevelSize")?,
                params.get_count("bevelSegments")?,
            ))
        } else {
            None
        };

        if inner >= outer {
            return Err(GeometryError::invalid(
                "innerRadius",
                format!("must be smaller than outerRadius ({outer})"),
            ));
        }

        let outline = star(points, inner, outer);
        let rings = sections(steps, depth, bevel);
        let mut builder = MeshBuilder::new();

        // Side walls
        let ring_indices: Vec<Vec<u32>> = rings
            .iter()
            .map(|section| {
                outline
                    .iter()
                    .map(|p| {
                        let q = grow(*p, section.offset);
                        let normal = unit_or(Vector3::new(p.x, p.y, 0.0), Vector3::x());
                        builder.vertex(Point3::new(q.x, q.y, section.z), normal)
                    })
                    .collect()
            })
            .collect();

        let n = outline.len();
        for pair in ring_indices.windows(2) {
            let (near, far) = (&pair[0], &pair[1]);
            for i in 0..n {
                let j = (i + 1) % n;
                builder.quad(near[i], near[j], far[j], far[i]);
            }
        }

        // Caps, fanned from the origin; the star is convex about it
        if let (Some(front), Some(back)) = (rings.first(), rings.last()) {
            cap(&mut builder, &outline, *front, -1.0);
            cap(&mut builder, &outline, *back, 1.0);
        }

        builder.translate(Vector3::new(0.0, 0.0, -depth / 2.0));
        finish(builder, self.kind())
    }
}

fn cap(builder: &mut MeshBuilder, outline: &[Vector2<f32>], section: Section, facing: f32) {
    let normal = Vector3::new(0.0, 0.0, facing);
    let center = builder.vertex(Point3::new(0.0, 0.0, section.z), normal);
    let ring: Vec<u32> = outline
        .iter()
        .map(|p| {
            let q = grow(*p, section.offset);
            builder.vertex(Point3::new(q.x, q.y, section.z), normal)
        })
        .collect();
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        if facing > 0.0 {
            builder.triangle(center, ring[i], ring[j]);
        } else {
            builder.triangle(center, ring[j], ring[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamInput;

    #[test]
    fn test_flat_extrusion_counts() {
        let mut params = ExtrudeFactory.schema();
        params.set("bevelEnabled", ParamInput::Bool(false)).unwrap();
        let surface = ExtrudeFactory.build(&params).unwrap();
        // 10 outline edges: one wall quad each plus two 10-triangle caps
        assert_eq!(surface.triangle_count(), 10 * 2 + 10 * 2);

        let (lo, hi) = surface.mesh.bounds().unwrap();
        assert!((lo.z + 0.2).abs() < 1e-5);
        assert!((hi.z - 0.2).abs() < 1e-5);
        assert!((hi.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bevel_adds_rings() {
        let flat = {
            let mut params = ExtrudeFactory.schema();
            params.set("bevelEnabled", ParamInput::Bool(false)).unwrap();
            ExtrudeFactory.build(&params).unwrap()
        };
        let bevelled = ExtrudeFactory.build_default().unwrap();
        assert!(bevelled.triangle_count() > flat.triangle_count());
        let (_, hi) = bevelled.mesh.bounds().unwrap();
        // outer point grows by bevelSize
        assert!((hi.y - 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_inner_must_be_smaller() {
        let mut params = ExtrudeFactory.schema();
        params.set("innerRadius", ParamInput::Number(1.5)).unwrap();
        assert!(matches!(
            ExtrudeFactory.build(&params),
            Err(GeometryError::InvalidParameter { .. })
        ));
    }
}
