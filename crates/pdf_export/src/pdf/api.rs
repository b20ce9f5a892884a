//! PDF Export Public API

use super::options::PdfExportOptions;
use super::renderer::RasterPage;
use super::writer::{PdfDocumentWriter, PdfError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write raster pages to a PDF file
///
/// ```ignore
/// use pdf_export::pdf::{write_raster_pdf, PdfExportOptions, RasterPage};
///
/// let pages = vec![/* raster pages */];
/// let options = PdfExportOptions::new().with_title("Jane Smith - Resume");
///
/// write_raster_pdf(&pages, "jane_smith_resume.pdf", options)?;
/// ```
pub fn write_raster_pdf(
    pages: &[RasterPage],
    path: impl AsRef<Path>,
    options: PdfExportOptions,
) -> Result<()> {
    validate_pages(pages)?;

    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    PdfDocumentWriter::new(options).write(pages, writer)
}

/// Write raster pages to PDF bytes in memory
pub fn raster_pdf_bytes(pages: &[RasterPage], options: PdfExportOptions) -> Result<Vec<u8>> {
    validate_pages(pages)?;
    PdfDocumentWriter::new(options).write_to_bytes(pages)
}

/// Check that pages can be written.
///
/// Every page needs a positive size and every image a positive size and
/// pixel area.
pub fn validate_pages(pages: &[RasterPage]) -> Result<()> {
    if pages.is_empty() {
        return Err(PdfError::InvalidDocument("No pages to export".to_string()));
    }

    for (i, page) in pages.iter().enumerate() {
        if !(page.width > 0.0 && page.height > 0.0) {
            return Err(PdfError::InvalidDocument(format!(
                "Page {} has invalid size {}x{}",
                i, page.width, page.height
            )));
        }
        for placed in &page.images {
            if placed.image.width == 0 || placed.image.height == 0 {
                return Err(PdfError::InvalidDocument(format!(
                    "Page {} has an image with no pixels",
                    i
                )));
            }
            if !(placed.width > 0.0 && placed.height > 0.0) {
                return Err(PdfError::InvalidDocument(format!(
                    "Page {} places an image at invalid size {}x{}",
                    i, placed.width, placed.height
                )));
            }
        }
    }

    Ok(())
}
