//! PDF Image Handling
//!
//! Page bands are embedded as image XObjects, either as flate-compressed raw
//! RGB samples or as baseline JPEG with DCTDecode.

use super::objects::{PdfDictionary, PdfObject, PdfStream};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use thiserror::Error;

/// How band rasters are encoded inside the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Lossless raw RGB with FlateDecode
    #[default]
    Flate,
    /// Lossy JPEG with DCTDecode
    Jpeg,
}

/// Color space for images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }
}

/// Image compression filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// DCT (JPEG) compression
    DCTDecode,
    /// Flate (zlib) compression
    FlateDecode,
}

impl ImageFilter {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::DCTDecode => "DCTDecode",
            ImageFilter::FlateDecode => "FlateDecode",
        }
    }
}

/// Image data for embedding in PDF
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    /// Samples, encoded according to `filter`
    pub data: Vec<u8>,
    pub filter: Option<ImageFilter>,
}

impl ImageData {
    /// Wrap raw interleaved RGB samples
    pub fn from_raw_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ImageError::InvalidFormat(format!(
                "expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bits_per_component: 8,
            color_space: ColorSpace::DeviceRGB,
            data,
            filter: None,
        })
    }

    /// Encode a band raster for embedding.
    ///
    /// `quality` is the JPEG quality (1-100) and is ignored for flate.
    pub fn encode(band: &RgbImage, encoding: ImageEncoding, quality: u8) -> Result<Self, ImageError> {
        match encoding {
            ImageEncoding::Flate => {
                let mut image = Self::from_raw_rgb(band.as_raw().clone(), band.width(), band.height())?;
                image.compress()?;
                Ok(image)
            }
            ImageEncoding::Jpeg => {
                let mut jpeg = Vec::new();
                JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
                    .encode_image(band)
                    .map_err(|e| ImageError::Encode(e.to_string()))?;
                Ok(Self {
                    width: band.width(),
                    height: band.height(),
                    bits_per_component: 8,
                    color_space: ColorSpace::DeviceRGB,
                    data: jpeg,
                    filter: Some(ImageFilter::DCTDecode),
                })
            }
        }
    }

    /// Flate-compress raw samples in place
    pub fn compress(&mut self) -> Result<(), ImageError> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;

        if self.filter.is_some() {
            return Ok(());
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.data)?;
        self.data = encoder.finish()?;
        self.filter = Some(ImageFilter::FlateDecode);
        Ok(())
    }

    /// Convert to PDF XObject stream
    pub fn to_xobject(&self) -> PdfStream {
        let mut dict = PdfDictionary::new().with_type("XObject");

        dict.insert("Subtype", PdfObject::name("Image"));
        dict.insert("Width", PdfObject::int(self.width as i64));
        dict.insert("Height", PdfObject::int(self.height as i64));
        dict.insert("BitsPerComponent", PdfObject::int(self.bits_per_component as i64));
        dict.insert("ColorSpace", PdfObject::name(self.color_space.pdf_name()));

        if let Some(filter) = self.filter {
            dict.insert("Filter", PdfObject::name(filter.pdf_name()));
        }

        PdfStream {
            dict,
            data: self.data.clone(),
            // Raw samples are left for the writer's stream compression
            compressed: self.filter.is_some(),
        }
    }
}

/// Error type for image operations
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Image reference in a PDF document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Resource name (e.g. "Im0")
    pub name: String,
    pub obj_ref: u32,
    pub width: u32,
    pub height: u32,
}

/// Hands out resource names for embedded images
#[derive(Debug, Default)]
pub struct ImageManager {
    images: Vec<ImageRef>,
}

impl ImageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image object and return its reference
    pub fn register_image(&mut self, obj_ref: u32, width: u32, height: u32) -> ImageRef {
        let image_ref = ImageRef {
            name: format!("Im{}", self.images.len()),
            obj_ref,
            width,
            height,
        };
        self.images.push(image_ref.clone());
        image_ref
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn band() -> RgbImage {
        RgbImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                Rgb([255, 255, 255])
            } else {
                Rgb([30, 60, 90])
            }
        })
    }

    #[test]
    fn test_raw_rgb_length_checked() {
        assert!(ImageData::from_raw_rgb(vec![0; 3 * 4], 2, 2).is_ok());
        assert!(ImageData::from_raw_rgb(vec![0; 10], 2, 2).is_err());
    }

    #[test]
    fn test_encode_flate() {
        let image = ImageData::encode(&band(), ImageEncoding::Flate, 95).unwrap();
        assert_eq!((image.width, image.height), (16, 8));
        assert_eq!(image.filter, Some(ImageFilter::FlateDecode));
        assert!(image.data.len() < 16 * 8 * 3);

        let xobject = image.to_xobject();
        assert!(xobject.compressed);
        assert!(matches!(xobject.dict.get("Filter"), Some(PdfObject::Name(n)) if n == "FlateDecode"));
    }

    #[test]
    fn test_encode_jpeg() {
        let image = ImageData::encode(&band(), ImageEncoding::Jpeg, 95).unwrap();
        assert_eq!((image.width, image.height), (16, 8));
        assert_eq!(image.color_space, ColorSpace::DeviceRGB);
        assert_eq!(image.filter, Some(ImageFilter::DCTDecode));
        assert_eq!(&image.data[..2], &[0xFF, 0xD8]);

        // Dimensions come from the band even for odd sizes
        let odd = RgbImage::from_pixel(1588, 37, Rgb([200, 10, 10]));
        let image = ImageData::encode(&odd, ImageEncoding::Jpeg, 40).unwrap();
        assert_eq!((image.width, image.height), (1588, 37));
        let xobject = image.to_xobject();
        assert!(xobject.compressed);
        assert!(matches!(xobject.dict.get("Width"), Some(PdfObject::Integer(1588))));
    }

    #[test]
    fn test_uncompressed_xobject_left_for_writer() {
        let image = ImageData::from_raw_rgb(vec![0; 3 * 25], 5, 5).unwrap();
        let xobject = image.to_xobject();
        assert!(!xobject.compressed);
        assert!(xobject.dict.get("Filter").is_none());
        assert!(xobject.dict.contains_key("ColorSpace"));
    }

    #[test]
    fn test_image_manager() {
        let mut manager = ImageManager::new();

        let first = manager.register_image(10, 1588, 2268);
        assert_eq!(first.name, "Im0");
        assert_eq!(first.obj_ref, 10);

        let second = manager.register_image(12, 1588, 400);
        assert_eq!(second.name, "Im1");
        assert_eq!(manager.image_count(), 2);
        assert_eq!(manager.images()[1], second);
    }

    #[test]
    fn test_image_error_display() {
        let err = ImageData::from_raw_rgb(vec![0; 4], 1, 1).unwrap_err();
        assert!(err.to_string().starts_with("Invalid image format: expected 3 RGB bytes"));

        let err = ImageError::from(io::Error::other("disk"));
        assert!(matches!(err, ImageError::Io(_)));
        assert_eq!(err.to_string(), "IO error: disk");
    }
}
