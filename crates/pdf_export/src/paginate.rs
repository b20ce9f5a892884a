//! Pagination of a scaled raster into page-sized horizontal bands
//!
//! Pagination works on pixel bands, not on content boundaries: every page
//! receives the next slice of the source raster, full width, whose scaled
//! height is at most one printable area.

use image::{imageops, RgbImage, RgbaImage};
use render_surface::Color;
use serde::Serialize;

use crate::geometry::{PageGeometry, ScaledLayout};

/// Remaining heights at or below this many millimetres are rounding noise
const HEIGHT_EPSILON: f64 = 1e-9;

/// One output page's share of the source raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice {
    /// Zero-based page index
    pub index: usize,
    /// First source row of the band (fractional pixels)
    pub source_y: f64,
    /// Band height in source pixels (fractional)
    pub source_height: f64,
    /// Height the band occupies on the page, in millimetres
    pub placed_height: f64,
}

impl PageSlice {
    /// Whole source rows covered by this band as `(top, rows)`.
    ///
    /// Both band edges are rounded, so consecutive slices tile the raster
    /// without overlap. A band is at least one row tall and may extend past
    /// the bottom of the raster.
    pub fn pixel_rows(&self) -> (u32, u32) {
        let top = self.source_y.round().max(0.0) as u32;
        let bottom = (self.source_y + self.source_height).round().max(0.0) as u32;
        (top, bottom.saturating_sub(top).max(1))
    }
}

/// Plan the page sequence for a scaled raster.
///
/// A raster that fits the printable height yields one slice covering the
/// whole image. Otherwise the loop consumes one printable height per page
/// until nothing remains, which takes
/// `ceil(final_height / printable_height)` iterations. Leftovers below
/// `HEIGHT_EPSILON` are float residue and do not start a page.
pub fn plan_pages(layout: &ScaledLayout, geometry: &PageGeometry) -> Vec<PageSlice> {
    let content_height = geometry.printable_height();

    if layout.fits_single_page(geometry) {
        return vec![PageSlice {
            index: 0,
            source_y: 0.0,
            source_height: layout.raster_height_px as f64,
            placed_height: layout.final_height,
        }];
    }

    let raster_height = layout.raster_height_px as f64;
    let mut slices = Vec::with_capacity((layout.final_height / content_height).ceil() as usize);
    let mut remaining_height = layout.final_height;
    let mut current_source_y = 0.0;

    while remaining_height > HEIGHT_EPSILON {
        let page_content_height = remaining_height.min(content_height);
        let source_height = page_content_height / layout.final_height * raster_height;

        slices.push(PageSlice {
            index: slices.len(),
            source_y: current_source_y,
            source_height,
            placed_height: page_content_height,
        });

        remaining_height -= content_height;
        current_source_y += source_height;
    }

    tracing::debug!(
        "Planned {} pages for {:.2}mm of content ({:.2}mm per page)",
        slices.len(),
        layout.final_height,
        content_height
    );
    slices
}

/// Copy a slice's band out of the raster.
///
/// The band is pre-filled with `background`, so rows past the end of the
/// source and any transparency come out opaque.
pub fn extract_band(raster: &RgbaImage, slice: &PageSlice, background: Color) -> RgbImage {
    let (top, rows) = slice.pixel_rows();
    let mut fill = background;
    fill.a = 255;
    let mut band = RgbaImage::from_pixel(raster.width(), rows, fill.to_rgba());

    if top < raster.height() {
        let available = rows.min(raster.height() - top);
        let source = imageops::crop_imm(raster, 0, top, raster.width(), available).to_image();
        imageops::overlay(&mut band, &source, 0, 0);
    }

    image::DynamicImage::ImageRgba8(band).to_rgb8()
}
