use std::path::PathBuf;

use thiserror::Error;

/// Result type for loading and rendering.
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric degeneracies reported by on-demand math operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLength,

    #[error("matrix is singular: no usable pivot in column {column}")]
    Singular { column: usize },
}

/// Errors that can occur while loading resources or producing a frame.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("face {face}: {message}")]
    UnsupportedFace { face: usize, message: String },

    #[error("face {face}: {attribute} index {index} out of range (have {len})")]
    IndexOutOfRange {
        face: usize,
        attribute: &'static str,
        index: usize,
        len: usize,
    },

    #[error("texture buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA8")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to allocate {width}x{height} frame buffer")]
    Allocation { width: u32, height: u32 },

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unknown shading model `{0}` (expected unlit, diffuse, phong or normal_mapped)")]
    UnknownShadingModel(String),

    #[error("unknown primitive mode `{0}` (expected wireframe or filled)")]
    UnknownPrimitiveMode(String),

    #[error("invalid arguments: {0}")]
    Arguments(String),
}
