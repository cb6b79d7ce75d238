//! Per-frame behaviors applied to the live model before each draw.

use crate::config::SpinConfig;
use crate::transform::NodeTransform;

/// Clock reading handed to every update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the shell started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Mutates the model transform once per frame.
///
/// Updates run in registration order and only while a model is present.
pub trait FrameUpdate {
    fn update(&mut self, transform: &mut NodeTransform, time: FrameTime);
}

impl<F> FrameUpdate for F
where
    F: FnMut(&mut NodeTransform, FrameTime),
{
    fn update(&mut self, transform: &mut NodeTransform, time: FrameTime) {
        self(transform, time)
    }
}

/// Built-in model rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spin {
    /// Rotation is `elapsed * rate` on each axis.
    Absolute { rate: [f32; 3] },
    /// Rotation about Y grows by `step` each frame.
    Incremental { step: f32 },
}

impl Spin {
    pub fn absolute(rate: [f32; 3]) -> Self {
        Spin::Absolute { rate }
    }

    pub fn incremental(step: f32) -> Self {
        Spin::Incremental { step }
    }

    pub fn from_config(config: SpinConfig) -> Option<Self> {
        match config {
            SpinConfig::None => None,
            SpinConfig::Absolute { rate } => Some(Spin::absolute(rate)),
            SpinConfig::Incremental { step } => Some(Spin::incremental(step)),
        }
    }
}

impl FrameUpdate for Spin {
    fn update(&mut self, transform: &mut NodeTransform, time: FrameTime) {
        match *self {
            Spin::Absolute { rate } => {
                let r = &mut transform.rotation;
                if rate[0] != 0.0 {
                    r.x = time.elapsed * rate[0];
                }
                if rate[1] != 0.0 {
                    r.y = time.elapsed * rate[1];
                }
                if rate[2] != 0.0 {
                    r.z = time.elapsed * rate[2];
                }
            }
            Spin::Incremental { step } => transform.rotation.rotate(0.0, step, 0.0),
        }
    }
}
