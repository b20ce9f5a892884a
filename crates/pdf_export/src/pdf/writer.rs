//! PDF Writer
//!
//! File structure (header, body, cross-reference table, trailer), object
//! numbering, and optional flate compression of streams.

use super::document::{create_catalog, create_pages, DocumentInfo, MediaBox, PdfPage, PdfVersion};
use super::objects::{PdfDictionary, PdfObject, PdfSerializer, PdfStream};
use super::options::PdfExportOptions;
use super::renderer::{PdfRenderer, RasterPage};
use std::io::{self, Write};
use thiserror::Error;

/// Error type for PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Byte offset of a written object
#[derive(Debug)]
struct ObjectEntry {
    obj_num: u32,
    offset: u64,
}

/// PDF file writer
pub struct PdfWriter<W: Write> {
    writer: W,
    position: u64,
    objects: Vec<ObjectEntry>,
    next_obj_num: u32,
    version: PdfVersion,
    compress: bool,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W, version: PdfVersion) -> Self {
        Self {
            writer,
            position: 0,
            objects: Vec::new(),
            next_obj_num: 1,
            version,
            compress: true,
        }
    }

    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.position += data.len() as u64;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Allocate a new object number
    pub fn allocate_object(&mut self) -> u32 {
        let num = self.next_obj_num;
        self.next_obj_num += 1;
        num
    }

    /// Write the PDF header
    pub fn write_header(&mut self) -> Result<()> {
        self.write_str(&format!("%PDF-{}\n", self.version.as_str()))?;
        // Binary marker so transfer tools treat the file as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    /// Write an indirect object
    pub fn write_object(&mut self, obj_num: u32, object: &PdfObject) -> Result<()> {
        let offset = self.position;

        self.write_str(&format!("{} 0 obj\n", obj_num))?;
        let mut serializer = PdfSerializer::new(Vec::new());
        serializer.write_object(object)?;
        self.write_bytes(&serializer.into_inner())?;
        self.write_str("\nendobj\n")?;

        self.objects.push(ObjectEntry { obj_num, offset });
        Ok(())
    }

    /// Write a stream object, compressing it first if enabled
    pub fn write_stream_object(&mut self, obj_num: u32, mut stream: PdfStream) -> Result<()> {
        if self.compress && !stream.compressed {
            stream = Self::compress_stream(stream)?;
        }
        stream
            .dict
            .insert("Length", PdfObject::Integer(stream.data.len() as i64));

        self.write_object(obj_num, &PdfObject::Stream(stream))
    }

    fn compress_stream(mut stream: PdfStream) -> Result<PdfStream> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&stream.data)?;
        stream.data = encoder.finish()?;
        stream.compressed = true;
        stream.dict.insert("Filter", PdfObject::name("FlateDecode"));

        Ok(stream)
    }

    /// Write the cross-reference table and trailer
    pub fn write_xref_and_trailer(&mut self, catalog_ref: u32, info_ref: Option<u32>) -> Result<()> {
        let xref_offset = self.position;

        self.objects.sort_by_key(|e| e.obj_num);
        let entries: Vec<_> = self.objects.iter().map(|e| (e.obj_num, e.offset)).collect();

        self.write_str("xref\n")?;
        self.write_str(&format!("0 {}\n", self.next_obj_num))?;
        self.write_str("0000000000 65535 f \n")?;

        let mut expected_num = 1u32;
        for (obj_num, offset) in entries {
            // Allocated but never written objects become free entries
            while expected_num < obj_num {
                self.write_str("0000000000 65535 f \n")?;
                expected_num += 1;
            }
            self.write_str(&format!("{:010} 00000 n \n", offset))?;
            expected_num = obj_num + 1;
        }
        while expected_num < self.next_obj_num {
            self.write_str("0000000000 65535 f \n")?;
            expected_num += 1;
        }

        self.write_str("trailer\n")?;
        let mut trailer = PdfDictionary::new();
        trailer.insert("Size", PdfObject::Integer(self.next_obj_num as i64));
        trailer.insert("Root", PdfObject::reference(catalog_ref));
        if let Some(info) = info_ref {
            trailer.insert("Info", PdfObject::reference(info));
        }

        let mut serializer = PdfSerializer::new(Vec::new());
        serializer.write_object(&PdfObject::Dictionary(trailer))?;
        self.write_bytes(&serializer.into_inner())?;
        self.write_str("\n")?;

        self.write_str("startxref\n")?;
        self.write_str(&format!("{}\n", xref_offset))?;
        self.write_str("%%EOF\n")?;

        Ok(())
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// High-level PDF document writer
pub struct PdfDocumentWriter {
    options: PdfExportOptions,
}

impl PdfDocumentWriter {
    pub fn new(options: PdfExportOptions) -> Self {
        Self { options }
    }

    fn document_info(&self) -> DocumentInfo {
        let mut info = DocumentInfo::new();
        info.title = self.options.title.clone();
        info.author = self.options.author.clone();
        info.subject = self.options.subject.clone();
        info.keywords = self.options.keywords.clone();
        if let Some(ref creator) = self.options.creator {
            info.creator = Some(creator.clone());
        }
        info
    }

    /// Write a complete PDF document
    pub fn write<W: Write>(&self, pages: &[RasterPage], writer: W) -> Result<()> {
        if pages.is_empty() {
            return Err(PdfError::InvalidDocument("No pages to export".to_string()));
        }

        let mut pdf = PdfWriter::new(writer, self.options.pdf_version.into());
        pdf.set_compression(self.options.compress);
        pdf.write_header()?;

        let catalog_ref = pdf.allocate_object();
        let pages_ref = pdf.allocate_object();
        let info_ref = pdf.allocate_object();

        // Page, content and image objects, allocated in page order
        let mut renderer = PdfRenderer::new();
        let mut layout = Vec::with_capacity(pages.len());
        for page in pages {
            let page_ref = pdf.allocate_object();
            let content_ref = pdf.allocate_object();
            let refs: Vec<_> = page
                .images
                .iter()
                .map(|placed| {
                    let obj_ref = pdf.allocate_object();
                    renderer.image_manager_mut().register_image(
                        obj_ref,
                        placed.image.width,
                        placed.image.height,
                    )
                })
                .collect();
            layout.push((page_ref, content_ref, refs));
        }

        pdf.write_object(catalog_ref, &create_catalog(pages_ref).into())?;

        let page_refs: Vec<u32> = layout.iter().map(|(page_ref, _, _)| *page_ref).collect();
        pdf.write_object(pages_ref, &create_pages(&page_refs).into())?;

        pdf.write_object(info_ref, &self.document_info().to_dictionary().into())?;

        for (page, (page_ref, content_ref, refs)) in pages.iter().zip(&layout) {
            let content = renderer.render_page(page, refs);
            pdf.write_stream_object(*content_ref, PdfStream::new(content.into_bytes()))?;

            for (placed, image_ref) in page.images.iter().zip(refs) {
                pdf.write_stream_object(image_ref.obj_ref, placed.image.to_xobject())?;
            }

            let mut pdf_page = PdfPage::new(MediaBox::from_dimensions(page.width, page.height))
                .with_content(*content_ref);
            for image_ref in refs {
                pdf_page.add_image(image_ref.name.clone(), image_ref.obj_ref);
            }
            pdf.write_object(*page_ref, &pdf_page.to_dictionary(pages_ref).into())?;
        }

        pdf.write_xref_and_trailer(catalog_ref, Some(info_ref))?;
        pdf.finish()?;

        tracing::debug!(
            "Wrote PDF with {} pages and {} images",
            pages.len(),
            renderer.image_manager().image_count()
        );
        Ok(())
    }

    /// Write a complete PDF document to bytes
    pub fn write_to_bytes(&self, pages: &[RasterPage]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(pages, &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::super::images::ImageData;
    use super::*;

    fn create_test_page() -> RasterPage {
        let image = ImageData::from_raw_rgb(vec![200; 3 * 4 * 2], 4, 2).unwrap();
        RasterPage::new(595.0, 842.0).with_image(image, 14.0, 14.0, 567.0, 283.5)
    }

    #[test]
    fn test_pdf_writer_header() {
        let mut buffer = Vec::new();
        let mut writer = PdfWriter::new(&mut buffer, PdfVersion::V1_4);
        writer.write_header().unwrap();

        let output = String::from_utf8_lossy(&buffer);
        assert!(output.starts_with("%PDF-1.4\n"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut writer = PdfWriter::new(Vec::new(), PdfVersion::V1_4);
        writer.write_header().unwrap();
        let first = writer.allocate_object();
        let second = writer.allocate_object();
        writer.write_object(second, &PdfObject::int(2)).unwrap();
        writer.write_object(first, &PdfObject::int(1)).unwrap();
        writer.write_xref_and_trailer(first, None).unwrap();
        let bytes = writer.finish().unwrap();

        let text = String::from_utf8_lossy(&bytes).into_owned();
        let xref = text.find("xref\n").unwrap();
        let rows: Vec<&str> = text[xref..].lines().skip(2).take(3).collect();
        for (num, row) in rows.iter().enumerate().skip(1) {
            let offset: usize = row[..10].parse().unwrap();
            let expected = format!("{} 0 obj", num);
            assert!(bytes[offset..].starts_with(expected.as_bytes()));
        }
        assert!(text.contains("/Size 3"));
    }

    #[test]
    fn test_pdf_document_writer() {
        let writer = PdfDocumentWriter::new(PdfExportOptions::default());
        let pdf_bytes = writer.write_to_bytes(&[create_test_page()]).unwrap();

        let pdf_str = String::from_utf8_lossy(&pdf_bytes);
        assert!(pdf_str.starts_with("%PDF-1.4"));
        assert!(pdf_str.contains("/Type /Catalog"));
        assert!(pdf_str.contains("/Type /Pages"));
        assert!(pdf_str.contains("/Type /Page "));
        assert!(pdf_str.contains("/Subtype /Image"));
        assert!(pdf_str.contains("/XObject << /Im0 6 0 R >>"));
        assert!(pdf_str.contains("trailer"));
        assert!(pdf_str.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_pdf_with_metadata() {
        let options = PdfExportOptions::new()
            .with_title("Jane Smith - Resume")
            .with_author("Jane Smith")
            .with_creator("Resume Studio");

        let pdf_bytes = PdfDocumentWriter::new(options)
            .write_to_bytes(&[create_test_page()])
            .unwrap();

        let pdf_str = String::from_utf8_lossy(&pdf_bytes);
        assert!(pdf_str.contains("/Title (Jane Smith - Resume)"));
        assert!(pdf_str.contains("/Author (Jane Smith)"));
        assert!(pdf_str.contains("/Creator (Resume Studio)"));
        assert!(pdf_str.contains("/CreationDate (D:"));
    }

    #[test]
    fn test_pdf_no_compression() {
        let options = PdfExportOptions::new().with_compression(false);
        let pdf_bytes = PdfDocumentWriter::new(options)
            .write_to_bytes(&[create_test_page()])
            .unwrap();

        let pdf_str = String::from_utf8_lossy(&pdf_bytes);
        assert!(pdf_str.contains("567 0 0 283.5 14 544.5 cm"));
        assert!(!pdf_str.contains("FlateDecode"));
    }

    #[test]
    fn test_empty_pages_error() {
        let writer = PdfDocumentWriter::new(PdfExportOptions::default());
        assert!(matches!(
            writer.write_to_bytes(&[]),
            Err(PdfError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_multiple_pages() {
        let writer = PdfDocumentWriter::new(PdfExportOptions::default());
        let pages = vec![create_test_page(), create_test_page(), create_test_page()];

        let pdf_bytes = writer.write_to_bytes(&pages).unwrap();
        let pdf_str = String::from_utf8_lossy(&pdf_bytes);

        assert!(pdf_str.contains("/Count 3"));
        assert_eq!(pdf_str.matches("/Subtype /Image").count(), 3);
        assert!(pdf_str.contains("/Im2"));
    }
}
