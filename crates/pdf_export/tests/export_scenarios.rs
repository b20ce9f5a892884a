//! End-to-end export scenarios
//!
//! These tests drive [`DocumentExporter`] with scripted rasterizers so the
//! raster size is known exactly, then inspect the written PDF and the state
//! of the document body afterwards.

use image::{Rgba, RgbaImage};
use pdf_export::{
    DocumentExporter, ExportError, ExportSettings, FileSink, ImageEncoding, MemorySink,
};
use render_surface::{
    DocumentTree, Element, ElementContent, Length, NodeId, RasterOptions, Rasterizer, RenderError,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

/// What a rasterizer saw when it was called
#[derive(Debug, Clone)]
struct Observation {
    mounted: bool,
    wrapper_width: Option<Length>,
    clone_has_content_class: bool,
    scale: f32,
}

/// Produces a raster of a fixed pixel size
struct FixedRasterizer {
    width: u32,
    height: u32,
    seen: Mutex<Vec<Observation>>,
}

impl FixedRasterizer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn observations(&self) -> Vec<Observation> {
        self.seen.lock().unwrap().clone()
    }
}

impl Rasterizer for FixedRasterizer {
    fn scroll_size(&self, _tree: &DocumentTree, _node: NodeId) -> render_surface::Result<(u32, u32)> {
        Ok((self.width / 2, self.height / 2))
    }

    fn rasterize(
        &self,
        tree: &DocumentTree,
        node: NodeId,
        options: &RasterOptions,
    ) -> render_surface::Result<RgbaImage> {
        let element = tree.get(node);
        self.seen.lock().unwrap().push(Observation {
            mounted: element.is_some(),
            wrapper_width: element.map(|e| e.style.width),
            clone_has_content_class: element
                .and_then(|e| e.children.first())
                .is_some_and(|c| c.has_class("resume-preview")),
            scale: options.scale,
        });

        // Dark top row on a transparent field
        let mut raster = RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 0]));
        for x in 0..self.width {
            raster.put_pixel(x, 0, Rgba([10, 10, 10, 255]));
        }
        Ok(raster)
    }
}

/// Fails every rasterization and counts the attempts
#[derive(Default)]
struct FailingRasterizer {
    calls: AtomicUsize,
    mounted_during_call: Mutex<Option<bool>>,
}

impl Rasterizer for FailingRasterizer {
    fn scroll_size(&self, _tree: &DocumentTree, _node: NodeId) -> render_surface::Result<(u32, u32)> {
        Ok((794, 1123))
    }

    fn rasterize(
        &self,
        tree: &DocumentTree,
        node: NodeId,
        _options: &RasterOptions,
    ) -> render_surface::Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.mounted_during_call.lock().unwrap() = Some(tree.contains(node));
        Err(RenderError::InvalidLayout("canvas allocation failed".to_string()))
    }
}

/// Panics in the middle of rasterization
struct PanickingRasterizer;

impl Rasterizer for PanickingRasterizer {
    fn scroll_size(&self, _tree: &DocumentTree, _node: NodeId) -> render_surface::Result<(u32, u32)> {
        Ok((794, 1123))
    }

    fn rasterize(
        &self,
        _tree: &DocumentTree,
        _node: NodeId,
        _options: &RasterOptions,
    ) -> render_surface::Result<RgbaImage> {
        panic!("rasterizer crashed");
    }
}

/// Reports each rasterization and waits to be released before finishing
struct GatedRasterizer {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedRasterizer {
    fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let rasterizer = Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (rasterizer, entered_rx, release_tx)
    }
}

impl Rasterizer for GatedRasterizer {
    fn scroll_size(&self, _tree: &DocumentTree, _node: NodeId) -> render_surface::Result<(u32, u32)> {
        Ok((200, 100))
    }

    fn rasterize(
        &self,
        _tree: &DocumentTree,
        _node: NodeId,
        _options: &RasterOptions,
    ) -> render_surface::Result<RgbaImage> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255])))
    }
}

fn container() -> Element {
    let content = Element::div()
        .with_class("resume-preview")
        .with_child(Element::new("h1").with_content(ElementContent::Empty));
    Element::div().with_class("preview-pane").with_child(content)
}

fn pdf_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn single_page_when_content_fits() {
    let exporter =
        DocumentExporter::new(FixedRasterizer::new(1600, 2200), MemorySink::new(), ExportSettings::default())
            .unwrap();

    let receipt = exporter.export(&container(), "John Doe (2024)!").unwrap();
    assert_eq!(receipt.file_name, "john_doe_2024_resume.pdf");
    assert_eq!(receipt.page_count, 1);

    let artifacts = exporter.sink().artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].meta.mime, "application/pdf");
    assert_eq!(artifacts[0].bytes.len(), receipt.byte_len);

    let text = pdf_text(&artifacts[0].bytes);
    assert!(text.contains("/Count 1"));
    assert!(text.contains("/Width 1600"));
    assert!(text.contains("/Height 2200"));
}

#[test]
fn three_pages_with_reduced_content_height() {
    // 110mm tall page with 5mm margins: 100mm of content per page
    let mut settings = ExportSettings::default();
    settings.page.height_mm = 110.0;
    settings.compress = false;

    let exporter =
        DocumentExporter::new(FixedRasterizer::new(1600, 2200), MemorySink::new(), settings).unwrap();
    let plan = exporter.plan(&container()).unwrap();
    assert_eq!(plan.page_count(), 3);
    let last = plan.pages[2].placed_height;
    assert!((last - (plan.layout.final_height - 200.0)).abs() < 1e-9);

    let receipt = exporter.export(&container(), "Jane").unwrap();
    assert_eq!(receipt.page_count, 3);

    let text = pdf_text(&exporter.sink().artifacts()[0].bytes);
    assert!(text.contains("/Count 3"));
    assert_eq!(text.matches("/Subtype /Image").count(), 3);
    // 2200 source rows split 800 / 800 / 600
    assert_eq!(text.matches("/Height 800 ").count(), 2);
    assert_eq!(text.matches("/Height 600 ").count(), 1);
}

#[test]
fn clone_is_mounted_only_while_rasterizing() {
    let exporter =
        DocumentExporter::new(FixedRasterizer::new(800, 600), MemorySink::new(), ExportSettings::default())
            .unwrap();
    exporter.export(&container(), "Jane").unwrap();

    let seen = exporter.rasterizer().observations();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].mounted);
    assert_eq!(seen[0].wrapper_width, Some(Length::Mm(210.0)));
    assert!(seen[0].clone_has_content_class);
    assert_eq!(seen[0].scale, 2.0);

    assert!(exporter.surface().lock().unwrap().is_empty());
}

#[test]
fn missing_content_never_rasterizes() {
    let exporter =
        DocumentExporter::new(FailingRasterizer::default(), MemorySink::new(), ExportSettings::default())
            .unwrap();
    let empty = Element::div().with_class("preview-pane");

    let err = exporter.export(&empty, "Jane").unwrap_err();
    assert!(matches!(err, ExportError::MissingContent { .. }));
    assert_eq!(exporter.rasterizer().calls.load(Ordering::SeqCst), 0);
    assert!(exporter.sink().is_empty());
}

#[test]
fn rasterization_failure_cleans_up_and_saves_nothing() {
    let exporter =
        DocumentExporter::new(FailingRasterizer::default(), MemorySink::new(), ExportSettings::default())
            .unwrap();

    let err = exporter.export(&container(), "Jane").unwrap_err();
    assert!(matches!(err, ExportError::Rasterization(_)));
    assert_eq!(err.to_string(), "Failed to generate PDF. Please try again.");

    assert_eq!(exporter.rasterizer().calls.load(Ordering::SeqCst), 1);
    assert_eq!(*exporter.rasterizer().mounted_during_call.lock().unwrap(), Some(true));
    assert!(exporter.surface().lock().unwrap().is_empty());
    assert!(exporter.sink().is_empty());
    assert!(!exporter.is_busy());
}

#[test]
fn panicking_rasterizer_still_unmounts() {
    let exporter =
        DocumentExporter::new(PanickingRasterizer, MemorySink::new(), ExportSettings::default()).unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| exporter.export(&container(), "Jane")));
    assert!(outcome.is_err());

    let surface = exporter.surface();
    let tree = surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    assert!(tree.is_empty());
    assert!(!exporter.is_busy());
}

#[test]
fn shared_surface_keeps_host_nodes() {
    let surface = Arc::new(Mutex::new(DocumentTree::new()));
    let host_node = surface.lock().unwrap().mount(Element::div().with_class("app-root"));

    let exporter =
        DocumentExporter::new(FixedRasterizer::new(400, 300), MemorySink::new(), ExportSettings::default())
            .unwrap()
            .with_surface(Arc::clone(&surface));
    exporter.export(&container(), "Jane").unwrap();

    let tree = surface.lock().unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.contains(host_node));
}

#[test]
fn file_sink_writes_named_pdf() {
    let temp_dir = TempDir::new().unwrap();
    let exporter = DocumentExporter::new(
        FixedRasterizer::new(1600, 4000),
        FileSink::new(temp_dir.path()),
        ExportSettings::default(),
    )
    .unwrap();

    let receipt = exporter.export(&container(), "Ana María López").unwrap();
    let path = temp_dir.path().join("ana_mar_a_l_pez_resume.pdf");
    assert_eq!(receipt.location.as_deref(), Some(path.as_path()));

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert_eq!(receipt.page_count, 2);
    assert!(pdf_text(&bytes).contains("/Count 2"));
}

#[test]
fn save_failure_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("downloads");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let exporter = DocumentExporter::new(
        FixedRasterizer::new(400, 300),
        FileSink::new(&blocker),
        ExportSettings::default(),
    )
    .unwrap();

    let err = exporter.export(&container(), "Jane").unwrap_err();
    assert!(matches!(err, ExportError::Save { ref file_name, .. } if file_name == "jane_resume.pdf"));
}

#[test]
fn jpeg_encoding_embeds_dct_images() {
    let mut settings = ExportSettings::default();
    settings.image_encoding = ImageEncoding::Jpeg;

    let exporter =
        DocumentExporter::new(FixedRasterizer::new(1588, 4000), MemorySink::new(), settings).unwrap();
    let receipt = exporter.export(&container(), "Jane").unwrap();

    let text = pdf_text(&exporter.sink().artifacts()[0].bytes);
    assert_eq!(text.matches("/Filter /DCTDecode").count(), receipt.page_count);
}

#[test]
fn prerendered_raster_skips_capture() {
    let exporter =
        DocumentExporter::new(FixedRasterizer::new(4, 4), MemorySink::new(), ExportSettings::default())
            .unwrap();
    let raster = RgbaImage::from_pixel(1588, 1200, Rgba([255, 255, 255, 255]));

    let pdf = exporter.render_raster(&raster, "Jane").unwrap();
    assert_eq!(pdf.file_name, "jane_resume.pdf");
    assert_eq!(pdf.page_count, 1);
    assert!(pdf_text(&pdf.bytes).contains("/Width 1588"));

    assert!(exporter.rasterizer().observations().is_empty());
    assert!(exporter.sink().is_empty());
}

#[test]
fn busy_until_every_overlapping_export_finishes() {
    let (rasterizer, entered, release) = GatedRasterizer::new();
    let exporter =
        DocumentExporter::new(rasterizer, MemorySink::new(), ExportSettings::default()).unwrap();
    let content = container();

    thread::scope(|scope| {
        let first = scope.spawn(|| exporter.export(&content, "First"));
        entered.recv().unwrap();
        assert!(exporter.is_busy());

        // Waits on the document body until the first capture is done
        let second = scope.spawn(|| exporter.export(&content, "Second"));

        release.send(()).unwrap();
        first.join().unwrap().unwrap();

        entered.recv().unwrap();
        assert!(exporter.is_busy());

        release.send(()).unwrap();
        second.join().unwrap().unwrap();
    });

    assert!(!exporter.is_busy());
    assert_eq!(exporter.sink().len(), 2);
}
