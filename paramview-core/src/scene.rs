//! Static scene furniture: lights and the grid/axis helpers.

use nalgebra::{Point3, Vector3};

use crate::geometry::Segment;

/// Light shining from `position` toward the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    /// RGB packed as `0xRRGGBB`
    pub color: u32,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(position: Point3<f32>, color: u32, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
        }
    }

    /// Unit vector pointing from the scene toward the light
    pub fn direction(&self) -> Vector3<f32> {
        let v = self.position.coords;
        if v.norm_squared() == 0.0 {
            Vector3::z()
        } else {
            v.normalize()
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Point3::new(-1.0, 2.0, 4.0), 0xffffff, 1.0)
    }
}

/// Square grid on the XZ plane centered at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
}

impl GridHelper {
    pub fn new(size: f32, divisions: u32) -> Self {
        Self { size, divisions }
    }

    pub fn segments(&self) -> Vec<Segment> {
        let divisions = self.divisions.max(1);
        let half = self.size / 2.0;
        let step = self.size / divisions as f32;
        let mut segments = Vec::with_capacity(2 * (divisions as usize + 1));
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            segments.push(Segment {
                start: Point3::new(-half, 0.0, k),
                end: Point3::new(half, 0.0, k),
            });
            segments.push(Segment {
                start: Point3::new(k, 0.0, -half),
                end: Point3::new(k, 0.0, half),
            });
        }
        segments
    }
}

/// X/Y/Z axis lines of length `size` from the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesHelper {
    pub size: f32,
}

impl AxesHelper {
    /// Segments in X, Y, Z order
    pub fn segments(&self) -> [Segment; 3] {
        let o = Point3::origin();
        [
            Segment {
                start: o,
                end: Point3::new(self.size, 0.0, 0.0),
            },
            Segment {
                start: o,
                end: Point3::new(0.0, self.size, 0.0),
            },
            Segment {
                start: o,
                end: Point3::new(0.0, 0.0, self.size),
            },
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub lights: Vec<DirectionalLight>,
    pub grid: Option<GridHelper>,
    pub axes: Option<AxesHelper>,
}

impl Scene {
    /// Direction of the key light, falling back to a head-on light
    pub fn key_light(&self) -> Vector3<f32> {
        self.lights
            .first()
            .map(DirectionalLight::direction)
            .unwrap_or_else(Vector3::z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_line_count() {
        let grid = GridHelper::new(10.0, 10);
        let segments = grid.segments();
        assert_eq!(segments.len(), 22);
        assert!(segments.iter().all(|s| s.start.y == 0.0 && s.end.y == 0.0));
    }

    #[test]
    fn test_key_light_defaults_head_on() {
        let scene = Scene::default();
        assert_eq!(scene.key_light(), Vector3::z());

        let scene = Scene {
            lights: vec![DirectionalLight::default()],
            ..Scene::default()
        };
        assert!((scene.key_light().norm() - 1.0).abs() < 1e-6);
    }
}
