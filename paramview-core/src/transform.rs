//! Placement of the model node.
use nalgebra::{Matrix4, Rotation3, Vector3};

/// Euler angles in radians, applied X then Y then Z
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Rotation3::from_euler_angles(self.x, self.y, self.z).to_homogeneous()
    }
}

/// Position, rotation and scale of a scene node.
///
/// Survives regeneration: a rebuilt surface is installed under the same
/// transform it replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Vector3<f32>,
    pub rotation: RotationState,
    pub scale: Vector3<f32>,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: RotationState::default(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += Vector3::new(dx, dy, dz);
    }

    /// Multiply every scale axis by `factor`
    pub fn scale_by(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Model matrix: scale, then rotate, then translate
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation.matrix()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_accumulates() {
        let mut state = RotationState::default();
        state.rotate(0.1, 0.2, 0.3);
        state.rotate(0.0, 0.2, 0.0);
        assert_relative_eq!(state.x, 0.1);
        assert_relative_eq!(state.y, 0.4);
        assert_relative_eq!(state.z, 0.3);
    }

    #[test]
    fn test_identity_matrix() {
        assert_relative_eq!(NodeTransform::identity().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_quarter_turn_about_y() {
        let rotation = RotationState::new(0.0, FRAC_PI_2, 0.0);
        let p = rotation.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_node_matrix_scales_then_translates() {
        let mut node = NodeTransform::identity();
        node.scale_by(2.0);
        node.translate(0.0, 1.0, 0.0);
        let p = node.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(2.0, 1.0, 0.0), epsilon = 1e-6);
    }
}
