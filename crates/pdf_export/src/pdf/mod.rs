//! PDF Writing
//!
//! Produces image-only PDF documents from raster pages.
//!
//! # Architecture
//!
//! - `objects`: PDF object model (Dictionary, Array, Stream, Reference)
//! - `document`: Catalog, page tree, pages and the info dictionary
//! - `content`: Content stream operators
//! - `images`: Image XObjects and band encoding
//! - `renderer`: Raster pages to content streams
//! - `options`: Document options
//! - `api`: Public entry points

mod api;
mod content;
mod document;
mod images;
mod objects;
mod options;
mod renderer;
mod writer;

pub use api::*;
pub use document::{pdf_date, DocumentInfo, MediaBox, PdfVersion, DEFAULT_CREATOR, PRODUCER};
pub use images::{ImageData, ImageEncoding, ImageError, ImageFilter};
pub use options::*;
pub use renderer::{PlacedImage, RasterPage};
pub use writer::{PdfDocumentWriter, PdfError};
