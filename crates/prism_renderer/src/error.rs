//! Error types for the renderer's fallible surfaces.
//!
//! Rendering itself never fails; only configuration parsing and image
//! buffer writes can.

use thiserror::Error;

/// Errors from loading a [`RenderConfig`](crate::RenderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Non-finite value for '{field}'")]
    NonFinite { field: &'static str },
}

/// Errors from writing into an [`ImageBuffer`](crate::ImageBuffer).
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Row {row} out of range (height {height})")]
    RowOutOfRange { row: u32, height: u32 },
}
