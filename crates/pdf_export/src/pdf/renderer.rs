//! Raster pages to PDF content
//!
//! A [`RasterPage`] is a page of placed images in top-left layout
//! coordinates. The renderer flips them into PDF user space, whose origin
//! is the bottom-left corner.

use super::content::ContentStream;
use super::images::{ImageData, ImageManager, ImageRef};

/// An image placed on a page, in points from the top-left corner
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub image: ImageData,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One output page
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    pub images: Vec<PlacedImage>,
}

impl RasterPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            images: Vec::new(),
        }
    }

    /// Place an image with its top-left corner at (`x`, `y`)
    pub fn place(&mut self, image: ImageData, x: f64, y: f64, width: f64, height: f64) {
        self.images.push(PlacedImage {
            image,
            x,
            y,
            width,
            height,
        });
    }

    pub fn with_image(mut self, image: ImageData, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.place(image, x, y, width, height);
        self
    }
}

/// PDF page renderer
#[derive(Debug, Default)]
pub struct PdfRenderer {
    image_manager: ImageManager,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_manager(&self) -> &ImageManager {
        &self.image_manager
    }

    pub fn image_manager_mut(&mut self) -> &mut ImageManager {
        &mut self.image_manager
    }

    /// Render a page whose images were registered as `refs`, in order
    pub fn render_page(&self, page: &RasterPage, refs: &[ImageRef]) -> ContentStream {
        let mut content = ContentStream::new();

        for (placed, image_ref) in page.images.iter().zip(refs) {
            let pdf_y = page.height - placed.y - placed.height;
            content.draw_image(&image_ref.name, placed.x, pdf_y, placed.width, placed.height);
        }

        content
    }
}
