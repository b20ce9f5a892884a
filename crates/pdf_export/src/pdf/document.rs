//! PDF Document Structure
//!
//! Catalog, page tree, page objects and the info dictionary.

use super::objects::{PdfDictionary, PdfObject, PdfString};
use crate::geometry::mm_to_pt;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Creator recorded when the caller doesn't name one
pub const DEFAULT_CREATOR: &str = "Resume Builder";
/// Producer recorded in every document
pub const PRODUCER: &str = concat!("resume-export ", env!("CARGO_PKG_VERSION"));

/// PDF version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfVersion {
    /// PDF 1.4 (Acrobat 5)
    #[default]
    V1_4,
    /// PDF 1.7 (Acrobat 8)
    V1_7,
}

impl PdfVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSS+00'00'`)
pub fn pdf_date(at: DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// PDF document information
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// PDF date string
    pub creation_date: Option<String>,
}

impl DocumentInfo {
    /// Info stamped with the default creator, producer and the current time
    pub fn new() -> Self {
        Self {
            creator: Some(DEFAULT_CREATOR.to_string()),
            producer: Some(PRODUCER.to_string()),
            creation_date: Some(pdf_date(Utc::now())),
            ..Default::default()
        }
    }

    pub fn to_dictionary(&self) -> PdfDictionary {
        let mut dict = PdfDictionary::new();

        let entries = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                dict.insert(key, PdfObject::String(PdfString::text(value)));
            }
        }
        if !self.keywords.is_empty() {
            let keywords = self.keywords.join(", ");
            dict.insert("Keywords", PdfObject::String(PdfString::text(&keywords)));
        }
        if let Some(ref date) = self.creation_date {
            dict.insert("CreationDate", PdfObject::String(PdfString::from_str(date)));
        }

        dict
    }
}

/// Page media box in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub width: f64,
    pub height: f64,
}

impl MediaBox {
    pub fn from_dimensions(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Media box for a page measured in millimetres
    pub fn from_mm(width_mm: f64, height_mm: f64) -> Self {
        Self::from_dimensions(mm_to_pt(width_mm), mm_to_pt(height_mm))
    }

    pub fn to_array(&self) -> PdfObject {
        PdfObject::Array(vec![
            PdfObject::Real(0.0),
            PdfObject::Real(0.0),
            PdfObject::Real(self.width),
            PdfObject::Real(self.height),
        ])
    }
}

/// PDF page object
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub media_box: MediaBox,
    /// Content stream object number
    pub content_ref: Option<u32>,
    /// Image XObject resources (name -> object number)
    pub images: BTreeMap<String, u32>,
}

impl PdfPage {
    pub fn new(media_box: MediaBox) -> Self {
        Self {
            media_box,
            content_ref: None,
            images: BTreeMap::new(),
        }
    }

    pub fn with_content(mut self, content_ref: u32) -> Self {
        self.content_ref = Some(content_ref);
        self
    }

    pub fn add_image(&mut self, name: impl Into<String>, obj_ref: u32) {
        self.images.insert(name.into(), obj_ref);
    }

    /// Build the resources dictionary
    pub fn build_resources(&self) -> PdfDictionary {
        let mut resources = PdfDictionary::new();

        if !self.images.is_empty() {
            let mut xobject_dict = PdfDictionary::new();
            for (name, obj_ref) in &self.images {
                xobject_dict.insert(name.clone(), PdfObject::reference(*obj_ref));
            }
            resources.insert("XObject", PdfObject::Dictionary(xobject_dict));
        }

        // ProcSet is obsolete but still expected by PDF 1.4 readers
        resources.insert(
            "ProcSet",
            PdfObject::Array(vec![PdfObject::name("PDF"), PdfObject::name("ImageC")]),
        );

        resources
    }

    /// Build the page dictionary
    pub fn to_dictionary(&self, parent_ref: u32) -> PdfDictionary {
        let mut dict = PdfDictionary::new().with_type("Page");

        dict.insert("Parent", PdfObject::reference(parent_ref));
        dict.insert("MediaBox", self.media_box.to_array());
        dict.insert("Resources", PdfObject::Dictionary(self.build_resources()));

        if let Some(content_ref) = self.content_ref {
            dict.insert("Contents", PdfObject::reference(content_ref));
        }

        dict
    }
}

/// Create a catalog dictionary
pub fn create_catalog(pages_ref: u32) -> PdfDictionary {
    let mut dict = PdfDictionary::new().with_type("Catalog");
    dict.insert("Pages", PdfObject::reference(pages_ref));
    dict
}

/// Create the page tree root
pub fn create_pages(page_refs: &[u32]) -> PdfDictionary {
    let mut dict = PdfDictionary::new().with_type("Pages");

    let kids: Vec<PdfObject> = page_refs.iter().map(|&r| PdfObject::reference(r)).collect();

    dict.insert("Kids", PdfObject::Array(kids));
    dict.insert("Count", PdfObject::Integer(page_refs.len() as i64));

    dict
}
