//! PDF Export - paginated PDF output for rendered resumes
//!
//! This crate turns a rendered resume preview into a downloadable PDF. The
//! preview is rasterized off-screen at page width, scaled once to the
//! printable width, and cut into page-sized horizontal bands that are
//! embedded as images on successive A4 pages.
//!
//! # Modules
//!
//! - `geometry`: page size, margins and the raster scale
//! - `paginate`: page planning and band extraction
//! - `filename`: artifact naming
//! - `exporter`: the end-to-end export
//! - `sink`: where finished artifacts are saved
//! - `settings`: persisted export configuration
//! - `pdf`: the PDF writer

mod error;
mod exporter;
mod filename;
mod geometry;
mod paginate;
pub mod pdf;
mod settings;
mod sink;

pub use error::*;
pub use exporter::*;
pub use filename::*;
pub use geometry::*;
pub use paginate::*;
pub use pdf::ImageEncoding;
pub use settings::*;
pub use sink::*;
