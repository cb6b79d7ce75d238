//! paramview core: parametric shapes, the parameter panel, and the viewer
//! shell shared by the terminal and web hosts.
//!
//! Nothing in here touches a terminal or a browser; hosts supply a
//! [`RenderBackend`] and drive a [`ViewerShell`].

pub mod backend;
pub mod config;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod panel;
pub mod params;
pub mod projection;
pub mod scene;
pub mod shapes;
pub mod shell;
pub mod slot;
pub mod stl;
pub mod transform;
pub mod updates;

// Re-export commonly used types
pub use backend::{DrawItem, Frame, RenderBackend};
pub use config::ViewerConfig;
pub use controls::{OrbitControls, PointerButton};
pub use error::{GeometryError, LoadError, ParamError, RenderError, SetupError, ViewerError};
pub use geometry::{Mesh, Segment, Surface, Triangle, Vertex, Wireframe};
pub use loader::{LoadTicket, LoadTracker, ModelLoader};
pub use panel::{Control, ControlKind, ParameterPanel};
pub use params::{ParamInput, ParamValue, ParameterRecord};
pub use projection::Camera;
pub use scene::Scene;
pub use shapes::{GeometryFactory, ShapeRegistry};
pub use shell::{EditKey, ShellState, ViewerShell};
pub use slot::{ModelSlot, SceneNode};
pub use stl::StlLoader;
pub use transform::{NodeTransform, RotationState};
pub use updates::{FrameTime, FrameUpdate, Spin};
