//! Viewer configuration, loadable from JSON.
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes.

use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controls::OrbitControls;
use crate::error::SetupError;
use crate::projection::Camera;
use crate::scene::{AxesHelper, DirectionalLight, GridHelper, Scene};

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// Ground grid; `None` hides it.
    pub grid: Option<GridConfig>,
    /// Axis lines of this length; `None` hides them.
    pub axes: Option<f32>,
    pub controls: ControlsConfig,
    pub spin: SpinConfig,
    pub edit: EditSteps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: u32,
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light = DirectionalLight::default();
        let p = light.position;
        Self {
            position: [p.x, p.y, p.z],
            color: light.color,
            intensity: light.intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Automatic model rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SpinConfig {
    None,
    /// Rotation set to `time * rate` each frame, radians per second per axis.
    Absolute { rate: [f32; 3] },
    /// Rotation about Y advanced by `step` radians every frame.
    Incremental { step: f32 },
}

impl Default for SpinConfig {
    fn default() -> Self {
        SpinConfig::Absolute {
            rate: [1.0, 1.0, 0.0],
        }
    }
}

/// Fixed deltas applied by the model editor keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSteps {
    pub move_step: f32,
    pub rotate_step: f32,
    pub grow: f32,
    pub shrink: f32,
}

impl Default for EditSteps {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            rotate_step: 0.1,
            grow: 1.1,
            shrink: 0.9,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::geometry_demo()
    }
}

impl ViewerConfig {
    /// Close-up camera on a spinning shape.
    pub fn geometry_demo() -> Self {
        Self {
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            grid: None,
            axes: None,
            controls: ControlsConfig::default(),
            spin: SpinConfig::default(),
            edit: EditSteps::default(),
        }
    }

    /// Three-quarter view over a ground grid, slow turntable spin.
    pub fn model_editor() -> Self {
        Self {
            camera: CameraConfig {
                fov_degrees: 78.0,
                position: [5.0, 5.0, 5.0],
                ..CameraConfig::default()
            },
            grid: Some(GridConfig::default()),
            spin: SpinConfig::Incremental { step: 0.01 },
            ..Self::geometry_demo()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SetupError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SetupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(SetupError::Config(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(SetupError::Config(format!(
                "camera clip range must satisfy 0 < near < far, got {}..{}",
                camera.near, camera.far
            )));
        }
        if camera.position == camera.target {
            return Err(SetupError::Config(
                "camera.position must differ from camera.target".to_string(),
            ));
        }
        let factor = self.controls.damping_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(SetupError::Config(format!(
                "controls.damping_factor must be in (0, 1], got {factor}"
            )));
        }
        if self.edit.grow <= 0.0 || self.edit.shrink <= 0.0 {
            return Err(SetupError::Config(
                "edit scale factors must be positive".to_string(),
            ));
        }
        if let Some(grid) = &self.grid {
            if grid.size <= 0.0 || grid.divisions == 0 {
                return Err(SetupError::Config(
                    "grid needs a positive size and at least one division".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn camera(&self, width: u32, height: u32) -> Camera {
        let mut camera = Camera::new(width, height);
        camera.fov = self.camera.fov_degrees.to_radians();
        camera.near = self.camera.near;
        camera.far = self.camera.far;
        camera.position = Point3::from(self.camera.position);
        camera.target = Point3::from(self.camera.target);
        camera
    }

    pub fn orbit_controls(&self) -> OrbitControls {
        let mut controls = OrbitControls::new(Point3::from(self.camera.target));
        controls.enable_damping = self.controls.damping;
        controls.damping_factor = self.controls.damping_factor;
        controls.rotate_speed = self.controls.rotate_speed;
        controls.zoom_speed = self.controls.zoom_speed;
        controls.pan_speed = self.controls.pan_speed;
        controls
    }

    pub fn scene(&self) -> Scene {
        Scene {
            lights: vec![DirectionalLight::new(
                Point3::from(self.light.position),
                self.light.color,
                self.light.intensity,
            )],
            grid: self.grid.map(|g| GridHelper::new(g.size, g.divisions)),
            axes: self.axes.map(|size| AxesHelper { size }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ViewerConfig::from_json(r#"{ "camera": { "fov_degrees": 60 } }"#).unwrap();
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.light, LightConfig::default());
        assert_eq!(config.spin, SpinConfig::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_invalid_fov_rejected() {
        let err = ViewerConfig::from_json(r#"{ "camera": { "fov_degrees": 0 } }"#).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
        let err = ViewerConfig::from_json(r#"{ "camera": { "fov_degrees": 180 } }"#).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_serde_error() {
        assert!(matches!(
            ViewerConfig::from_json("{ camera"),
            Err(SetupError::Serde(_))
        ));
    }

    #[test]
    fn test_spin_modes_parse() {
        let config =
            ViewerConfig::from_json(r#"{ "spin": { "mode": "incremental", "step": 0.02 } }"#)
                .unwrap();
        assert_eq!(config.spin, SpinConfig::Incremental { step: 0.02 });
        let config = ViewerConfig::from_json(r#"{ "spin": { "mode": "none" } }"#).unwrap();
        assert_eq!(config.spin, SpinConfig::None);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ViewerConfig::model_editor();
        let text = config.to_json().unwrap();
        assert_eq!(ViewerConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_editor_preset_builds_scene() {
        let config = ViewerConfig::model_editor();
        config.validate().unwrap();
        let scene = config.scene();
        assert_eq!(scene.grid.map(|g| g.divisions), Some(10));
        let camera = config.camera(800, 600);
        assert!((camera.fov - 78f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(5.0, 5.0, 5.0));
    }
}
