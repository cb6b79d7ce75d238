//! Cylinders, truncated cones and cones

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};

use super::{angle_field, finish, grid, sweep_field, unit_or, GeometryFactory};
use crate::error::GeometryError;
use crate::geometry::{MeshBuilder, Surface};
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy)]
struct Frustum {
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
    theta_start: f32,
    theta_length: f32,
}

impl Frustum {
    fn build(&self, kind: &str) -> Result<Surface, GeometryError> {
        if self.radius_top <= 0.0 && self.radius_bottom <= 0.0 {
            return Err(GeometryError::invalid(
                "radiusBottom",
                "top and bottom radius cannot both be zero",
            ));
        }

        let mut builder = MeshBuilder::new();
        let half_height = self.height / 2.0;
        let slope = (self.radius_bottom - self.radius_top) / self.height;

        grid(
            &mut builder,
            self.radial_segments,
            self.height_segments,
            |col, row| {
                let u = col as f32 / self.radial_segments as f32;
                let v = row as f32 / self.height_segments as f32;
                let radius = v * (self.radius_bottom - self.radius_top) + self.radius_top;
                let theta = self.theta_start + u * self.theta_length;
                let (sin, cos) = theta.sin_cos();
                let position = Point3::new(radius * sin, half_height - v * self.height, radius * cos);
                let normal = unit_or(Vector3::new(sin, slope, cos), Vector3::y());
                (position, normal)
            },
        );

        if !self.open_ended {
            if self.radius_top > 0.0 {
                self.cap(&mut builder, true);
            }
            if self.radius_bottom > 0.0 {
                self.cap(&mut builder, false);
            }
        }

        finish(builder, kind)
    }

    fn cap(&self, builder: &mut MeshBuilder, top: bool) {
        let (radius, sign) = if top {
            (self.radius_top, 1.0)
        } else {
            (self.radius_bottom, -1.0)
        };
        let y = sign * self.height / 2.0;
        let normal = Vector3::new(0.0, sign, 0.0);

        let center = builder.vertex(Point3::new(0.0, y, 0.0), normal);
        let ring: Vec<u32> = (0..=self.radial_segments)
            .map(|i| {
                let theta =
                    self.theta_start + i as f32 / self.radial_segments as f32 * self.theta_length;
                let (sin, cos) = theta.sin_cos();
                builder.vertex(Point3::new(radius * sin, y, radius * cos), normal)
            })
            .collect();

        for pair in ring.windows(2) {
            if top {
                builder.triangle(pair[0], pair[1], center);
            } else {
                builder.triangle(pair[1], pair[0], center);
            }
        }
    }
}

fn frustum_schema(record: ParameterRecord) -> ParameterRecord {
    let record = record
        .number("height", 2.0, 0.1, 10.0, 0.1)
        .count("radialSegments", 16, 3, 64)
        .count("heightSegments", 1, 1, 32)
        .boolean("openEnded", false);
    let record = angle_field(record, "thetaStart", 0.0);
    sweep_field(record, "thetaLength", TAU, TAU)
}

fn frustum_from(
    params: &ParameterRecord,
    radius_top: f32,
    radius_bottom: f32,
) -> Result<Frustum, GeometryError> {
    Ok(Frustum {
        radius_top,
        radius_bottom,
        height: params.get_number("height")?,
        radial_segments: params.get_count("radialSegments")?,
        height_segments: params.get_count("heightSegments")?,
        open_ended: params.get_bool("openEnded")?,
        theta_start: params.get_number("thetaStart")?,
        theta_length: params.get_number("thetaLength")?,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CylinderFactory;

impl GeometryFactory for CylinderFactory {
    fn kind(&self) -> &'static str {
        "cylinder"
    }

    fn schema(&self) -> ParameterRecord {
        frustum_schema(
            ParameterRecord::new()
                .number("radiusTop", 1.0, 0.0, 5.0, 0.1)
                .number("radiusBottom", 1.0, 0.0, 5.0, 0.1),
        )
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let top = params.get_number("radiusTop")?;
        let bottom = params.get_number("radiusBottom")?;
        frustum_from(params, top, bottom)?.build(self.kind())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConeFactory;

impl GeometryFactory for ConeFactory {
    fn kind(&self) -> &'static str {
        "cone"
    }

    fn schema(&self) -> ParameterRecord {
        frustum_schema(ParameterRecord::new().number("radius", 1.0, 0.1, 5.0, 0.1))
    }

    fn build(&self, params: &ParameterRecord) -> Result<Surface, GeometryError> {
        let radius = params.get_number("radius")?;
        frustum_from(params, 0.0, radius)?.build(self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamInput;

    #[test]
    fn test_closed_cylinder_counts() {
        let surface = CylinderFactory.build_default().unwrap();
        // 16 side quads plus two 16-triangle caps
        assert_eq!(surface.triangle_count(), 16 * 2 + 16 * 2);
    }

    #[test]
    fn test_open_ended_drops_caps() {
        let mut params = CylinderFactory.schema();
        params.set("openEnded", ParamInput::Bool(true)).unwrap();
        assert_eq!(CylinderFactory.build(&params).unwrap().triangle_count(), 32);
    }

    #[test]
    fn test_cone_has_single_cap_and_tip() {
        let surface = ConeFactory.build_default().unwrap();
        // tip row collapses to one triangle per segment
        assert_eq!(surface.triangle_count(), 16 + 16);
        let (_, hi) = surface.mesh.bounds().unwrap();
        assert!((hi.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_radii_rejected() {
        let mut params = CylinderFactory.schema();
        params.set("radiusTop", ParamInput::Number(0.0)).unwrap();
        params.set("radiusBottom", ParamInput::Number(0.0)).unwrap();
        assert!(matches!(
            CylinderFactory.build(&params),
            Err(GeometryError::InvalidParameter { .. })
        ));
    }
}
