//! Rendering capability the shell draws through.

use nalgebra::Matrix4;

use crate::error::RenderError;
use crate::geometry::Surface;
use crate::projection::Camera;
use crate::scene::Scene;

/// The live model as handed to a draw call
#[derive(Debug)]
pub struct DrawItem<'a, H> {
    pub handle: &'a H,
    pub model: Matrix4<f32>,
}

/// Everything one draw call needs
#[derive(Debug)]
pub struct Frame<'a, H> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub item: Option<DrawItem<'a, H>>,
}

/// A renderer that owns uploaded surface resources.
///
/// Handles are only ever released by [`crate::slot::ModelSlot`], once each.
pub trait RenderBackend {
    type Handle;

    /// Upload a surface and return the handle to its resources.
    fn upload(&mut self, surface: &Surface) -> Self::Handle;

    /// Free the resources behind `handle`.
    fn release(&mut self, handle: Self::Handle);

    /// Resize the drawing surface.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn draw(&mut self, frame: &Frame<'_, Self::Handle>) -> Result<(), RenderError>;
}

#[cfg(test)]
pub(crate) mod recording {
    //! Backend double that records every call.

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferId(pub u64);

    #[derive(Debug, Clone, PartialEq)]
    pub struct DrawRecord {
        pub size: (u32, u32),
        pub aspect: f32,
        pub handle: Option<BufferId>,
        pub model: Option<Matrix4<f32>>,
    }

    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        next_id: u64,
        pub live: Vec<BufferId>,
        pub peak_live: usize,
        pub uploads: Vec<(BufferId, usize)>,
        pub releases: Vec<BufferId>,
        pub draws: Vec<DrawRecord>,
        pub size: (u32, u32),
    }

    impl RecordingBackend {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ..Self::default()
            }
        }
    }

    impl RenderBackend for RecordingBackend {
        type Handle = BufferId;

        fn upload(&mut self, surface: &Surface) -> BufferId {
            self.next_id += 1;
            let id = BufferId(self.next_id);
            self.live.push(id);
            self.peak_live = self.peak_live.max(self.live.len());
            self.uploads.push((id, surface.triangle_count()));
            id
        }

        fn release(&mut self, handle: BufferId) {
            assert!(
                !self.releases.contains(&handle),
                "{handle:?} released twice"
            );
            self.live.retain(|id| *id != handle);
            self.releases.push(handle);
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn draw(&mut self, frame: &Frame<'_, BufferId>) -> Result<(), RenderError> {
            if let Some(item) = &frame.item {
                assert!(
                    self.live.contains(item.handle),
                    "drew released buffer {:?}",
                    item.handle
                );
            }
            self.draws.push(DrawRecord {
                size: self.size,
                aspect: frame.camera.aspect,
                handle: frame.item.as_ref().map(|i| *i.handle),
                model: frame.item.as_ref().map(|i| i.model),
            });
            Ok(())
        }
    }
}
