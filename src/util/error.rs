//! Error types for the baking library.
//!
//! The per-point hot path never fails; these errors only come out of
//! setup work such as loading parameters or building an acceleration
//! structure.

use thiserror::Error;

/// Main error type for bake setup operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Parameter set failed validation
    #[error("Invalid bake parameters: {0}")]
    InvalidParams(String),

    /// Scene data references something that does not exist
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Vertex index out of bounds in a mesh triangle
    #[error("Mesh {mesh}: vertex index {index} out of bounds (count: {count})")]
    VertexOutOfBounds { mesh: usize, index: u32, count: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid parameters error.
    pub fn params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Create an invalid scene error.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }
}

/// Result type alias for bake setup operations.
pub type Result<T> = std::result::Result<T, Error>;
