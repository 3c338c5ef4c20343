//! Error types for canvas2d-raster.

use thiserror::Error;

/// Result type alias using CanvasError.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Most drawing operations silently ignore invalid input per the HTML5
/// canvas tradition; only construction and resource decoding report
/// errors through this type.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Invalid canvas dimensions (must be positive and within limits).
    #[error("Invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Invalid argument to a resource-accepting operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed or truncated TrueType font data.
    #[error("Invalid font: {0}")]
    InvalidFont(&'static str),
}
