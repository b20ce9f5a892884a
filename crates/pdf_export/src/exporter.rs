//! The document exporter
//!
//! [`DocumentExporter`] runs the whole export for one call:
//!
//! 1. find the resume content inside the supplied container
//! 2. mount an off-screen clone at page width and rasterize it
//! 3. scale the raster to the printable width and cut it into page bands
//! 4. encode the bands and write them as an image-only PDF
//! 5. hand the bytes to the [`ArtifactSink`]
//!
//! The clone is mounted through a [`MountGuard`](render_surface::MountGuard),
//! so it is detached on every exit path. Nothing is saved unless every
//! earlier step succeeded.

use chrono::{DateTime, Utc};
use image::RgbaImage;
use render_surface::{
    Color, DocumentTree, Element, Length, Position, RasterOptions, Rasterizer,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::filename::{artifact_file_name, PDF_MIME};
use crate::geometry::{mm_to_pt, PageGeometry, ScaledLayout, BACKGROUND};
use crate::paginate::{extract_band, plan_pages, PageSlice};
use crate::pdf::{raster_pdf_bytes, ImageData, PdfExportOptions, RasterPage};
use crate::settings::ExportSettings;
use crate::sink::ArtifactSink;
use crate::{ExportError, Result};

/// Horizontal offset that keeps the clone out of view
const OFFSCREEN_LEFT: f32 = -9999.0;

/// Outcome of a successful export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub file_name: String,
    pub mime: String,
    pub page_count: usize,
    pub byte_len: usize,
    pub location: Option<PathBuf>,
    pub exported_at: DateTime<Utc>,
}

/// A finished PDF that has not been saved yet
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Page plan for a container, computed without encoding or saving
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlan {
    pub geometry: PageGeometry,
    pub layout: ScaledLayout,
    pub pages: Vec<PageSlice>,
}

impl ExportPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Build the off-screen wrapper around a clone of `content`.
///
/// The wrapper is exactly one page wide and the clone fills it, with the
/// live preview's zoom, shadow, margin and width limits cleared.
pub fn offscreen_clone(content: &Element, geometry: &PageGeometry) -> Element {
    let mut clone = content.clone();
    clone.style.max_width = None;
    clone.style.width = Length::Percent(100.0);
    clone.style.transform = None;
    clone.style.margin = 0.0;
    clone.style.box_shadow = None;

    let mut wrapper = Element::div().with_child(clone);
    wrapper.style.position = Position::Absolute {
        left: OFFSCREEN_LEFT,
        top: 0.0,
    };
    wrapper.style.width = Length::Mm(geometry.page_width() as f32);
    wrapper.style.max_width = None;
    wrapper.style.background = Some(Color::WHITE);
    wrapper.style.padding = 0.0;
    wrapper.style.margin = 0.0;
    wrapper
}

/// Counts an export as running until dropped
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(running: &'a AtomicUsize) -> Self {
        running.fetch_add(1, Ordering::AcqRel);
        Self(running)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Exports rendered resumes to paginated PDFs
pub struct DocumentExporter<R, S> {
    rasterizer: R,
    sink: S,
    surface: Arc<Mutex<DocumentTree>>,
    settings: ExportSettings,
    geometry: PageGeometry,
    running: AtomicUsize,
}

impl<R: Rasterizer, S: ArtifactSink> DocumentExporter<R, S> {
    /// Create an exporter with its own empty document body
    pub fn new(rasterizer: R, sink: S, settings: ExportSettings) -> Result<Self> {
        let geometry = settings.page.geometry()?;
        if !(settings.raster_scale.is_finite() && settings.raster_scale > 0.0) {
            return Err(ExportError::InvalidGeometry(format!(
                "raster scale must be positive, got {}",
                settings.raster_scale
            )));
        }

        Ok(Self {
            rasterizer,
            sink,
            surface: Arc::new(Mutex::new(DocumentTree::new())),
            settings,
            geometry,
            running: AtomicUsize::new(0),
        })
    }

    /// Mount clones into a document body shared with the host
    pub fn with_surface(mut self, surface: Arc<Mutex<DocumentTree>>) -> Self {
        self.surface = surface;
        self
    }

    pub fn surface(&self) -> Arc<Mutex<DocumentTree>> {
        Arc::clone(&self.surface)
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether any export is running.
    ///
    /// Concurrent exports are not rejected; hosts use this to disable their
    /// export trigger.
    pub fn is_busy(&self) -> bool {
        self.running.load(Ordering::Acquire) > 0
    }

    fn lock_surface(&self) -> MutexGuard<'_, DocumentTree> {
        self.surface
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Export the resume inside `container` and save it as
    /// `<sanitized base name>_resume.pdf`
    pub fn export(&self, container: &Element, base_name: &str) -> Result<ExportReceipt> {
        self.run_export(|| self.render(container, base_name))
    }

    /// Export an already rasterized document
    pub fn export_raster(&self, raster: &RgbaImage, base_name: &str) -> Result<ExportReceipt> {
        self.run_export(|| self.render_raster(raster, base_name))
    }

    fn run_export(&self, render: impl FnOnce() -> Result<RenderedPdf>) -> Result<ExportReceipt> {
        let _busy = BusyGuard::enter(&self.running);
        let started = Instant::now();

        let result = render().and_then(|pdf| self.save(pdf));

        match &result {
            Ok(receipt) => tracing::info!(
                "Exported {} ({} pages, {} bytes) in {:?}",
                receipt.file_name,
                receipt.page_count,
                receipt.byte_len,
                started.elapsed()
            ),
            Err(e) => tracing::error!("PDF export failed: {}", e),
        }
        result
    }

    /// Produce the PDF for `container` without saving it
    pub fn render(&self, container: &Element, base_name: &str) -> Result<RenderedPdf> {
        let content = self.find_content(container)?;
        let raster = self.capture(content)?;
        self.render_raster(&raster, base_name)
    }

    /// Produce a PDF from an already rasterized document
    pub fn render_raster(&self, raster: &RgbaImage, base_name: &str) -> Result<RenderedPdf> {
        let layout = ScaledLayout::compute(raster.width(), raster.height(), &self.geometry)?;
        let slices = plan_pages(&layout, &self.geometry);
        let pages = self.compose_pages(raster, &layout, &slices)?;
        let bytes = raster_pdf_bytes(&pages, self.pdf_options(base_name))?;

        Ok(RenderedPdf {
            file_name: artifact_file_name(base_name),
            bytes,
            page_count: pages.len(),
        })
    }

    /// Compute the page plan for `container`
    pub fn plan(&self, container: &Element) -> Result<ExportPlan> {
        let content = self.find_content(container)?;
        let raster = self.capture(content)?;
        let layout = ScaledLayout::compute(raster.width(), raster.height(), &self.geometry)?;
        let pages = plan_pages(&layout, &self.geometry);
        Ok(ExportPlan {
            geometry: self.geometry,
            layout,
            pages,
        })
    }

    fn find_content<'a>(&self, container: &'a Element) -> Result<&'a Element> {
        container
            .query_selector_class(&self.settings.content_class)
            .ok_or_else(|| ExportError::MissingContent {
                class: self.settings.content_class.clone(),
            })
    }

    /// Rasterize an off-screen clone of `content`
    fn capture(&self, content: &Element) -> Result<RgbaImage> {
        let wrapper = offscreen_clone(content, &self.geometry);
        let mut surface = self.lock_surface();
        let mounted = surface.mount_scoped(wrapper);
        let node = mounted.id();

        let (width, height) = self
            .rasterizer
            .scroll_size(&mounted, node)
            .map_err(ExportError::Rasterization)?;
        let options = RasterOptions {
            scale: self.settings.raster_scale,
            background: BACKGROUND,
            width: Some(width),
            height: Some(height),
        };
        let raster = self
            .rasterizer
            .rasterize(&mounted, node, &options)
            .map_err(ExportError::Rasterization)?;

        tracing::debug!(
            "Captured {}x{} css px as {}x{} raster",
            width,
            height,
            raster.width(),
            raster.height()
        );
        Ok(raster)
    }

    fn compose_pages(
        &self,
        raster: &RgbaImage,
        layout: &ScaledLayout,
        slices: &[PageSlice],
    ) -> Result<Vec<RasterPage>> {
        let page_width = mm_to_pt(self.geometry.page_width());
        let page_height = mm_to_pt(self.geometry.page_height());
        let margin = mm_to_pt(self.geometry.margin());
        let placed_width = mm_to_pt(layout.final_width);
        let quality = self.settings.quality_percent();

        slices
            .iter()
            .map(|slice| -> Result<RasterPage> {
                let band = extract_band(raster, slice, BACKGROUND);
                let image = ImageData::encode(&band, self.settings.image_encoding, quality)?;
                Ok(RasterPage::new(page_width, page_height).with_image(
                    image,
                    margin,
                    margin,
                    placed_width,
                    mm_to_pt(slice.placed_height),
                ))
            })
            .collect()
    }

    fn pdf_options(&self, base_name: &str) -> PdfExportOptions {
        let mut options = PdfExportOptions::new()
            .with_subject("Resume")
            .with_keyword("resume")
            .with_compression(self.settings.compress);
        let display_name = base_name.trim();
        if !display_name.is_empty() {
            options = options.with_title(format!("{} - Resume", display_name));
        }
        if let Some(ref author) = self.settings.author {
            options = options.with_author(author.clone());
        }
        if let Some(ref creator) = self.settings.creator {
            options = options.with_creator(creator.clone());
        }
        options
    }

    fn save(&self, pdf: RenderedPdf) -> Result<ExportReceipt> {
        let saved = self
            .sink
            .save(&pdf.file_name, PDF_MIME, &pdf.bytes)
            .map_err(|source| ExportError::Save {
                file_name: pdf.file_name.clone(),
                source,
            })?;

        Ok(ExportReceipt {
            file_name: saved.file_name,
            mime: saved.mime,
            page_count: pdf.page_count,
            byte_len: saved.byte_len,
            location: saved.location,
            exported_at: Utc::now(),
        })
    }
}

impl<R, S> DocumentExporter<R, S>
where
    R: Rasterizer + Send + Sync + 'static,
    S: ArtifactSink + Send + Sync + 'static,
{
    /// Run [`export`](Self::export) on the blocking pool
    pub async fn export_async(
        self: Arc<Self>,
        container: Element,
        base_name: String,
    ) -> Result<ExportReceipt> {
        tokio::task::spawn_blocking(move || self.export(&container, &base_name))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))?
    }
}
