//! Single-occupancy holder for the model currently shown in the scene.

use tracing::debug;

use crate::backend::{DrawItem, RenderBackend};
use crate::geometry::Surface;
use crate::transform::NodeTransform;

/// A surface placed in the scene with its uploaded resources
#[derive(Debug)]
pub struct SceneNode<H> {
    pub surface: Surface,
    pub transform: NodeTransform,
    handle: H,
}

impl<H> SceneNode<H> {
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Owns at most one [`SceneNode`] and is the only releaser of its handle.
#[derive(Debug)]
pub struct ModelSlot<H> {
    node: Option<SceneNode<H>>,
    generation: u64,
}

impl<H> ModelSlot<H> {
    pub fn new() -> Self {
        Self {
            node: None,
            generation: 0,
        }
    }

    /// Swap in `surface` with an identity transform.
    pub fn replace<B>(&mut self, backend: &mut B, surface: Surface)
    where
        B: RenderBackend<Handle = H>,
    {
        self.replace_with(backend, surface, NodeTransform::identity());
    }

    /// Release the previous node (if any) before uploading the new one, so
    /// at most one generation of resources is alive at a time.
    pub fn replace_with<B>(&mut self, backend: &mut B, surface: Surface, transform: NodeTransform)
    where
        B: RenderBackend<Handle = H>,
    {
        self.release_current(backend);

        let handle = backend.upload(&surface);
        self.generation += 1;
        debug!(
            generation = self.generation,
            triangles = surface.triangle_count(),
            segments = surface.wireframe.len(),
            "model slot filled"
        );
        self.node = Some(SceneNode {
            surface,
            transform,
            handle,
        });
    }

    pub fn current(&self) -> Option<&SceneNode<H>> {
        self.node.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut SceneNode<H>> {
        self.node.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Number of surfaces this slot has held so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn draw_item(&self) -> Option<DrawItem<'_, H>> {
        self.node.as_ref().map(|node| DrawItem {
            handle: &node.handle,
            model: node.transform.matrix(),
        })
    }

    /// Release the live node, leaving the slot empty.
    pub fn teardown<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        self.release_current(backend);
    }

    fn release_current<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        if let Some(old) = self.node.take() {
            backend.release(old.handle);
        }
    }
}

impl<H> Default for ModelSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}
