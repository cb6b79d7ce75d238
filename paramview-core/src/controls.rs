//! Damped orbit navigation: pointer drag orbits, secondary drag pans,
//! wheel dollies. Deltas accumulate from input and are applied a fraction
//! at a time in [`OrbitControls::update`].

use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::projection::Camera;

/// Keeps the polar angle off the poles so `look_at` stays well defined.
const POLE_EPSILON: f32 = 1e-4;

/// Deltas smaller than this are treated as settled.
const SETTLE_EPSILON: f32 = 1e-6;

/// Per-notch dolly ratio.
const DOLLY_STEP: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    button: PointerButton,
    x: f32,
    y: f32,
}

/// Orbit/dolly/pan controller for a [`Camera`]
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    /// Fraction of pending motion applied per update, in `(0, 1]`
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
    drag: Option<Drag>,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.1,
            max_distance: 500.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
            drag: None,
        }
    }

    /// Orbit left around the target (positive angle moves the camera right-to-left).
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move toward the target by `ratio` (< 1 zooms in).
    pub fn dolly(&mut self, ratio: f32) {
        if ratio > 0.0 {
            self.scale *= ratio;
        }
    }

    /// Screen-space pan in pixels against a viewport of `height` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, height: u32) {
        let offset = camera.position - camera.target;
        let distance = offset.norm() * (camera.fov / 2.0).tan();
        let world_per_pixel = 2.0 * distance / height.max(1) as f32 * self.pan_speed;

        let Some(forward) = (-offset).try_normalize(SETTLE_EPSILON) else {
            return;
        };
        // Looking straight along `up` leaves no horizon; pan in world X then
        let right = forward
            .cross(&camera.up)
            .try_normalize(SETTLE_EPSILON)
            .unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);

        self.pan_offset += right * (-dx * world_per_pixel) + up * (dy * world_per_pixel);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        self.drag = Some(Drag { button, x, y });
    }

    /// Feed a pointer position; only acts while a button is held.
    pub fn pointer_move(&mut self, x: f32, y: f32, camera: &Camera, height: u32) {
        let Some(drag) = self.drag else {
            return;
        };
        let (dx, dy) = (x - drag.x, y - drag.y);
        match drag.button {
            PointerButton::Primary => {
                let h = height.max(1) as f32;
                self.rotate_left(2.0 * PI * dx / h * self.rotate_speed);
                self.rotate_up(2.0 * PI * dy / h * self.rotate_speed);
            }
            PointerButton::Secondary => self.pan(dx, dy, camera, height),
        }
        self.drag = Some(Drag { x, y, ..drag });
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Wheel notches; positive scrolls away from the target.
    pub fn wheel(&mut self, notches: f32) {
        let step = DOLLY_STEP.powf(self.zoom_speed);
        self.dolly(step.powf(-notches));
    }

    /// Apply pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.norm().max(SETTLE_EPSILON);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let applied = if self.enable_damping {
            self.damping_factor.clamp(SETTLE_EPSILON, 1.0)
        } else {
            1.0
        };

        theta += self.delta_theta * applied;
        phi = (phi + self.delta_phi * applied).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let pan = self.pan_offset * applied;
        self.target += pan;

        let new_offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let new_position = self.target + new_offset;
        let moved = (new_position - camera.position).norm() > SETTLE_EPSILON
            || (camera.target - self.target).norm() > SETTLE_EPSILON;

        camera.position = new_position;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - applied;
            self.delta_phi *= 1.0 - applied;
            self.pan_offset *= 1.0 - applied;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        if self.delta_theta.abs() < SETTLE_EPSILON {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < SETTLE_EPSILON {
            self.delta_phi = 0.0;
        }
        if self.pan_offset.norm() < SETTLE_EPSILON {
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;

        moved
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta == 0.0
            && self.delta_phi == 0.0
            && self.scale == 1.0
            && self.pan_offset == Vector3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        let mut camera = Camera::new(800, 600);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        camera
    }

    #[test]
    fn test_rotation_preserves_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Point3::origin());
        controls.enable_damping = false;
        controls.rotate_left(0.7);
        controls.rotate_up(0.3);
        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.distance_to_target(), 5.0, epsilon = 1e-4);
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn test_damping_settles() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Point3::origin());
        controls.damping_factor = 0.2;
        controls.rotate_left(1.0);

        let first = camera.position;
        assert!(controls.update(&mut camera));
        let after_one = camera.position;
        assert!((after_one - first).norm() > 0.0);

        let mut frames = 0;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 1000, "damping never settled");
        }
        assert!(controls.is_settled());
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_wheel_dollies() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Point3::origin());
        controls.wheel(-1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance_to_target(), 5.0 * 0.95, epsilon = 1e-4);

        controls.wheel(2.0);
        controls.update(&mut camera);
        assert!(camera.distance_to_target() > 5.0);
    }

    #[test]
    fn test_drag_only_while_pressed() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Point3::origin());
        controls.enable_damping = false;

        controls.pointer_move(100.0, 0.0, &camera, 600);
        assert!(!controls.update(&mut camera));

        controls.pointer_down(0.0, 0.0, PointerButton::Primary);
        controls.pointer_move(60.0, 0.0, &camera, 600);
        controls.pointer_up();
        assert!(controls.update(&mut camera));
        assert!(!controls.is_dragging());
    }

    #[test]
    fn test_pan_from_directly_above() {
        let mut camera = camera();
        camera.position = Point3::new(0.0, 5.0, 0.0);
        let mut controls = OrbitControls::new(Point3::origin());
        controls.enable_damping = false;
        controls.pointer_down(0.0, 0.0, PointerButton::Secondary);
        controls.pointer_move(50.0, 0.0, &camera, 600);
        controls.update(&mut camera);

        assert!(controls.target.iter().all(|c| c.is_finite()));
        assert!(camera.position.iter().all(|c| c.is_finite()));
        assert!(controls.target.x.abs() > 0.0);
        assert_relative_eq!(camera.distance_to_target(), 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_secondary_drag_pans_target() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Point3::origin());
        controls.enable_damping = false;
        controls.pointer_down(0.0, 0.0, PointerButton::Secondary);
        controls.pointer_move(50.0, 0.0, &camera, 600);
        controls.update(&mut camera);
        assert!(controls.target.x.abs() > 0.0);
        assert_relative_eq!(camera.distance_to_target(), 5.0, epsilon = 1e-4);
    }
}
