//! Page geometry and raster scaling
//!
//! All physical lengths are millimetres. A raster is converted to millimetres
//! once (`PX_TO_MM`), then scaled by a single factor that makes it exactly as
//! wide as the printable area. The same factor is applied to the height, so
//! the aspect ratio is preserved and tall content overflows onto further
//! pages instead of being shrunk.

use render_surface::Color;
use serde::Serialize;

use crate::{ExportError, Result};

/// A4 page width in millimetres
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 page height in millimetres
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Margin on every side in millimetres
pub const MARGIN_MM: f64 = 5.0;
/// Millimetres per raster pixel (96 pixels per inch)
pub const PX_TO_MM: f64 = 25.4 / 96.0;
/// PDF points per millimetre
pub const MM_TO_PT: f64 = 72.0 / 25.4;
/// Supersampling factor used when rasterizing for export
pub const RASTER_SCALE: f32 = 2.0;
/// Encoder quality for lossy band images (0.0 - 1.0)
pub const IMAGE_QUALITY: f32 = 0.95;
/// Opaque fill behind rasterized content and band rasters
pub const BACKGROUND: Color = Color::WHITE;

/// Convert millimetres to PDF points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// Physical page size and uniform margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    page_width: f64,
    page_height: f64,
    margin: f64,
}

impl PageGeometry {
    /// Create a geometry; the printable area must be positive on both axes
    pub fn new(page_width: f64, page_height: f64, margin: f64) -> Result<Self> {
        let geometry = Self {
            page_width,
            page_height,
            margin,
        };
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(ExportError::InvalidGeometry(format!(
                "margin must be non-negative, got {}",
                margin
            )));
        }
        if !(geometry.printable_width() > 0.0 && geometry.printable_height() > 0.0) {
            return Err(ExportError::InvalidGeometry(format!(
                "{}x{} page with {} margin leaves no printable area",
                page_width, page_height, margin
            )));
        }
        Ok(geometry)
    }

    /// Portrait A4 with 5 mm margins
    pub fn a4() -> Self {
        Self {
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            margin: MARGIN_MM,
        }
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Page width minus both side margins
    pub fn printable_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Page height minus top and bottom margins
    pub fn printable_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Physical size of a raster after the export scale is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledLayout {
    pub raster_width_px: u32,
    pub raster_height_px: u32,
    pub raster_width_mm: f64,
    pub raster_height_mm: f64,
    /// The one factor applied to both axes
    pub scale: f64,
    /// Factor that would fit the height on one page. Reported, never applied.
    pub fit_height_scale: f64,
    pub final_width: f64,
    pub final_height: f64,
}

impl ScaledLayout {
    /// Scale a raster of the given pixel size to the printable width
    pub fn compute(raster_width: u32, raster_height: u32, geometry: &PageGeometry) -> Result<Self> {
        if raster_width == 0 || raster_height == 0 {
            return Err(ExportError::InvalidGeometry(format!(
                "raster has no area ({}x{})",
                raster_width, raster_height
            )));
        }

        let raster_width_mm = raster_width as f64 * PX_TO_MM;
        let raster_height_mm = raster_height as f64 * PX_TO_MM;
        let scale = geometry.printable_width() / raster_width_mm;
        let fit_height_scale = geometry.printable_height() / raster_height_mm;

        Ok(Self {
            raster_width_px: raster_width,
            raster_height_px: raster_height,
            raster_width_mm,
            raster_height_mm,
            scale,
            fit_height_scale,
            final_width: raster_width_mm * scale,
            final_height: raster_height_mm * scale,
        })
    }

    /// Whether the scaled raster fits in one printable area
    pub fn fits_single_page(&self, geometry: &PageGeometry) -> bool {
        self.final_height <= geometry.printable_height()
    }
}
