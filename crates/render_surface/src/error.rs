//! Error types for the render surface

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Node is not mounted: {0}")]
    NodeNotMounted(String),

    #[error("Surface has no paintable area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("Surface of {width}x{height} px exceeds the raster limit")]
    SurfaceTooLarge { width: u64, height: u64 },

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
