//! Export settings
//!
//! Settings are persisted as `export-settings.json` in a host-chosen
//! directory. Every field has a default matching the fixed export constants,
//! so a partial or missing file still yields a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geometry::{
    PageGeometry, A4_HEIGHT_MM, A4_WIDTH_MM, IMAGE_QUALITY, MARGIN_MM, RASTER_SCALE,
};
use crate::pdf::ImageEncoding;
use crate::Result;

/// Class that marks the resume content inside the preview container
pub const CONTENT_CLASS: &str = "resume-preview";

/// File name used by [`SettingsManager`]
pub const SETTINGS_FILE: &str = "export-settings.json";

/// Page size and margin in millimetres
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
        }
    }
}

impl PageSettings {
    /// Validate into a page geometry
    pub fn geometry(&self) -> Result<PageGeometry> {
        PageGeometry::new(self.width_mm, self.height_mm, self.margin_mm)
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub page: PageSettings,
    /// Output pixels per CSS pixel when rasterizing
    pub raster_scale: f32,
    pub image_encoding: ImageEncoding,
    /// Lossy encoder quality (0.0 - 1.0)
    pub image_quality: f32,
    /// Flate-compress content streams and raw images
    pub compress: bool,
    /// Class of the element that holds the resume
    pub content_class: String,
    pub author: Option<String>,
    pub creator: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            page: PageSettings::default(),
            raster_scale: RASTER_SCALE,
            image_encoding: ImageEncoding::default(),
            image_quality: IMAGE_QUALITY,
            compress: true,
            content_class: CONTENT_CLASS.to_string(),
            author: None,
            creator: None,
        }
    }
}

impl ExportSettings {
    /// Encoder quality on the 0-100 scale
    pub fn quality_percent(&self) -> u8 {
        (self.image_quality.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Loads and saves [`ExportSettings`]
pub struct SettingsManager {
    settings_path: PathBuf,
    current: ExportSettings,
}

impl SettingsManager {
    /// Create a manager for the settings file inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            settings_path: dir.as_ref().join(SETTINGS_FILE),
            current: ExportSettings::default(),
        }
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    pub fn get(&self) -> &ExportSettings {
        &self.current
    }

    fn apply(&mut self, content: &str) {
        match serde_json::from_str::<ExportSettings>(content) {
            Ok(settings) => {
                self.current = settings;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse {}, using defaults: {}",
                    self.settings_path.display(),
                    e
                );
                self.current = ExportSettings::default();
            }
        }
    }

    /// Load settings from disk, or defaults if the file doesn't exist
    pub async fn load(&mut self) -> Result<&ExportSettings> {
        if self.settings_path.exists() {
            let content = tokio::fs::read_to_string(&self.settings_path).await?;
            self.apply(&content);
        } else {
            self.current = ExportSettings::default();
        }
        Ok(&self.current)
    }

    /// Load settings synchronously
    pub fn load_sync(&mut self) -> Result<&ExportSettings> {
        if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            self.apply(&content);
        } else {
            self.current = ExportSettings::default();
        }
        Ok(&self.current)
    }

    /// Save current settings to disk
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    /// Save settings synchronously
    pub fn save_sync(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    /// Replace settings and save synchronously
    pub fn update_sync(&mut self, settings: ExportSettings) -> Result<()> {
        self.current = settings;
        self.save_sync()
    }
}
