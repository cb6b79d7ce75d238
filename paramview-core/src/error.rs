//! Error taxonomy for the viewer core.

use thiserror::Error;

/// Rejected edit to a [`crate::params::ParameterRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    Unknown(String),

    #[error("parameter `{name}` expects a {expected} value")]
    WrongType { name: String, expected: &'static str },

    #[error("parameter `{name}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("parameter `{name}` does not accept `{value}`")]
    NotAChoice { name: String, value: String },

    #[error("parameter `{name}` has an invalid declaration: {reason}")]
    BadDeclaration { name: String, reason: String },
}

/// A shape factory could not build from the supplied parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("unknown shape kind `{0}`")]
    UnknownShape(String),
}

impl GeometryError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GeometryError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<ParamError> for GeometryError {
    fn from(err: ParamError) -> Self {
        let field = match &err {
            ParamError::Unknown(name) => name.clone(),
            ParamError::WrongType { name, .. }
            | ParamError::OutOfRange { name, .. }
            | ParamError::NotAChoice { name, .. }
            | ParamError::BadDeclaration { name, .. } => name.clone(),
        };
        GeometryError::InvalidParameter {
            field,
            reason: err.to_string(),
        }
    }
}

/// A model file could not be turned into a surface.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),

    #[error("unexpected end of file after {parsed} of {expected} triangles")]
    Truncated { parsed: usize, expected: usize },

    #[error("malformed model data: {0}")]
    Malformed(String),

    #[error("model contains no drawable triangles")]
    Empty,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The viewer could not be brought up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("render target `{0}` not found")]
    MissingTarget(String),

    #[error("viewport {width}x{height} has no area")]
    EmptyViewport { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Drawing a frame failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("io error while drawing: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Umbrella error for shell operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("model load failed: {0}")]
    ModelLoad(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("viewer has no shape attached")]
    NoShape,
}
