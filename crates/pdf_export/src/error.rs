//! Error types for export operations

use crate::pdf::{ImageError, PdfError};
use render_surface::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Resume content not found (no element with class '{class}')")]
    MissingContent { class: String },

    #[error("Failed to generate PDF. Please try again.")]
    Rasterization(#[source] RenderError),

    #[error("Failed to save {file_name}: {source}")]
    Save {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Image encode error: {0}")]
    Encode(#[from] ImageError),

    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("Export task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
