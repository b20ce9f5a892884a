//! Element tree types
//!
//! An [`Element`] is a node of the rendered preview: a tag, its classes, the
//! handful of style properties that influence rasterization, paintable
//! content, and child elements. Elements are plain values, so `clone()` is a
//! deep clone of the whole subtree.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::{RenderError, Result};

/// CSS reference pixels per inch
pub const CSS_PX_PER_INCH: f32 = 96.0;

/// Millimetres per inch
pub const MM_PER_INCH: f32 = 25.4;

/// CSS pixels per millimetre
pub const CSS_PX_PER_MM: f32 = CSS_PX_PER_INCH / MM_PER_INCH;

/// Color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as a lowercase `#rrggbb` string (alpha is dropped)
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to an `image` pixel
    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A CSS-like length
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    /// Size is derived from the containing block
    #[default]
    Auto,
    /// CSS reference pixels
    Px(f32),
    /// Millimetres
    Mm(f32),
    /// Percentage of the containing size
    Percent(f32),
}

impl Length {
    /// Resolve to CSS pixels against the containing size.
    ///
    /// Returns `None` for [`Length::Auto`].
    pub fn resolve(&self, containing: f32) -> Option<f32> {
        match *self {
            Length::Auto => None,
            Length::Px(px) => Some(px),
            Length::Mm(mm) => Some(mm * CSS_PX_PER_MM),
            Length::Percent(pct) => Some(containing * pct / 100.0),
        }
    }
}

/// How the host places an element on screen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Position {
    /// Normal flow
    #[default]
    Static,
    /// Taken out of flow at a fixed offset from the document origin
    Absolute { left: f32, top: f32 },
}

/// Style properties that influence rasterization
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementStyle {
    pub width: Length,
    pub max_width: Option<Length>,
    pub min_height: Option<Length>,
    /// Uniform padding in CSS pixels
    pub padding: f32,
    /// Uniform margin in CSS pixels
    pub margin: f32,
    pub background: Option<Color>,
    /// CSS transform; only `scale(<factor>)` is honoured when painting
    pub transform: Option<String>,
    pub box_shadow: Option<String>,
    pub position: Position,
}

impl ElementStyle {
    /// The paint scale encoded in `transform`, or 1.0
    pub fn transform_scale(&self) -> f32 {
        self.transform
            .as_deref()
            .and_then(|t| t.trim().strip_prefix("scale("))
            .and_then(|t| t.strip_suffix(')'))
            .and_then(|t| t.trim().parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0)
    }
}

/// Paintable content of an element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ElementContent {
    /// Nothing to paint besides background and children
    #[default]
    Empty,
    /// A solid box, standing in for a rendered line of text or a rule.
    ///
    /// Percent heights resolve against the content width.
    Block { height: Length, color: Color },
    /// An image given as a base64 `data:` URL
    Image {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
    /// Pixels that were already rendered by the host
    #[serde(skip)]
    Raster(RgbaImage),
}

/// A node of the rendered preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub style: ElementStyle,
    #[serde(default)]
    pub content: ElementContent,
    #[serde(default)]
    pub children: Vec<Element>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl Default for Element {
    fn default() -> Self {
        Self::div()
    }
}

impl Element {
    /// Create an empty element with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            style: ElementStyle::default(),
            content: ElementContent::Empty,
            children: Vec::new(),
        }
    }

    /// Create an empty `div`
    pub fn div() -> Self {
        Self::new(default_tag())
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_content(mut self, content: ElementContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Check whether the element carries a class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Find the first element carrying `class`, depth-first in document
    /// order. The element itself is a candidate.
    pub fn query_selector_class(&self, class: &str) -> Option<&Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.query_selector_class(class))
    }

    /// Number of elements in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_len).sum::<usize>()
    }
}

/// Decode a base64 `data:` URL into RGBA pixels
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::ImageDecode("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::ImageDecode("data URL has no payload".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(RenderError::ImageDecode(format!(
            "unsupported data URL encoding: {}",
            meta
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::ImageDecode(e.to_string()))?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| RenderError::ImageDecode(e.to_string()))?;
    Ok(decoded.to_rgba8())
}

/// Encode pixels as a `data:image/png;base64,` URL
pub fn png_data_url(pixels: &RgbaImage) -> Result<String> {
    let mut png = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| RenderError::ImageEncode(e.to_string()))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> Element {
        Element::div().with_class("page").with_child(
            Element::div()
                .with_class("toolbar")
                .with_child(Element::new("section").with_class("resume-preview")),
        )
    }

    #[test]
    fn test_query_selector_finds_nested() {
        let root = preview();
        let found = root.query_selector_class("resume-preview").unwrap();
        assert_eq!(found.tag, "section");
    }

    #[test]
    fn test_query_selector_matches_self() {
        let root = Element::div().with_class("resume-preview");
        assert!(root.query_selector_class("resume-preview").is_some());
    }

    #[test]
    fn test_query_selector_missing() {
        assert!(preview().query_selector_class("absent").is_none());
    }

    #[test]
    fn test_length_resolve() {
        assert_eq!(Length::Auto.resolve(100.0), None);
        assert_eq!(Length::Px(12.0).resolve(100.0), Some(12.0));
        assert_eq!(Length::Percent(50.0).resolve(300.0), Some(150.0));
        let a4 = Length::Mm(210.0).resolve(0.0).unwrap();
        assert!((a4 - 793.7).abs() < 0.1);
    }

    #[test]
    fn test_transform_scale() {
        let mut style = ElementStyle::default();
        assert_eq!(style.transform_scale(), 1.0);
        style.transform = Some("scale(0.5)".to_string());
        assert_eq!(style.transform_scale(), 0.5);
        style.transform = Some("rotate(45deg)".to_string());
        assert_eq!(style.transform_scale(), 1.0);
        style.transform = Some("none".to_string());
        assert_eq!(style.transform_scale(), 1.0);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("1e40af"), Some(Color::rgb(0x1e, 0x40, 0xaf)));
        assert_eq!(Color::from_hex("#00000080"), Some(Color::rgba(0, 0, 0, 0x80)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::WHITE.to_hex(), "#ffffff");
    }

    #[test]
    fn test_data_url_decodes_png() {
        let pixels = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let url = png_data_url(&pixels).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_data_url_rejects_plain_text() {
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("https://example.com/photo.png").is_err());
    }

    #[test]
    fn test_layout_json() {
        let json = r#"{
            "classes": ["resume-preview"],
            "style": { "width": { "mm": 210.0 }, "padding": 8.0,
                       "background": { "r": 255, "g": 255, "b": 255 } },
            "children": [
                { "content": { "type": "block", "height": { "px": 40.0 },
                               "color": { "r": 30, "g": 64, "b": 175 } } }
            ]
        }"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.tag, "div");
        assert!(element.has_class("resume-preview"));
        assert_eq!(element.style.width, Length::Mm(210.0));
        assert_eq!(element.style.background, Some(Color::WHITE));
        assert_eq!(element.subtree_len(), 2);
        assert!(matches!(
            element.children[0].content,
            ElementContent::Block { height: Length::Px(h), .. } if h == 40.0
        ));
    }
}
