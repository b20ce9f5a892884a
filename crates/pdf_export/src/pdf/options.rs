//! PDF Export Options

use super::document::PdfVersion;
use serde::{Deserialize, Serialize};

/// Options for writing a PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfExportOptions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Creator application, defaults to "Resume Builder"
    #[serde(default)]
    pub creator: Option<String>,
    /// Whether to compress content streams and raw image samples
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default)]
    pub pdf_version: PdfVersionOption,
}

fn default_compress() -> bool {
    true
}

/// PDF version option for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PdfVersionOption {
    /// PDF 1.4
    #[default]
    V14,
    /// PDF 1.7
    V17,
}

impl From<PdfVersionOption> for PdfVersion {
    fn from(opt: PdfVersionOption) -> Self {
        match opt {
            PdfVersionOption::V14 => PdfVersion::V1_4,
            PdfVersionOption::V17 => PdfVersion::V1_7,
        }
    }
}

impl Default for PdfExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            subject: None,
            keywords: Vec::new(),
            creator: None,
            compress: true,
            pdf_version: PdfVersionOption::default(),
        }
    }
}

impl PdfExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_pdf_version(mut self, version: PdfVersionOption) -> Self {
        self.pdf_version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = PdfExportOptions::new()
            .with_title("Jane Smith - Resume")
            .with_keyword("resume")
            .with_compression(false)
            .with_pdf_version(PdfVersionOption::V17);

        assert_eq!(options.title.as_deref(), Some("Jane Smith - Resume"));
        assert_eq!(options.keywords, vec!["resume"]);
        assert!(!options.compress);
        assert_eq!(PdfVersion::from(options.pdf_version), PdfVersion::V1_7);
    }

    #[test]
    fn test_deserialize_defaults() {
        let options: PdfExportOptions = serde_json::from_str(r#"{"author":"Jane"}"#).unwrap();
        assert_eq!(options.author.as_deref(), Some("Jane"));
        assert!(options.compress);
        assert_eq!(options.pdf_version, PdfVersionOption::V14);
    }
}
