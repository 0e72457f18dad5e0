//! Persisted session settings.
//!
//! One JSON document, read at startup and written back on exit. Keys:
//!
//! ```json
//! {
//!     "watermark_text": "水印",
//!     "text_opacity": 50,
//!     "watermark_position": { "x": 0, "y": 0 },
//!     "output_format": "PNG",
//!     "output_folder": "output",
//!     "file_naming_rule": "original",
//!     "custom_prefix": "wm_",
//!     "custom_suffix": "_watermarked"
//! }
//! ```
//!
//! A position of `(0, 0)` means "unset". Missing keys keep their defaults.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::WatermarkResult;
use crate::watermark::{
    clamp_opacity, NamingKind, NamingRule, OutputFormat, OutputSpec, Point, Size, WatermarkSpec,
    DEFAULT_OPACITY_PERCENT, DEFAULT_TEXT,
};

pub const DEFAULT_PREFIX: &str = "wm_";
pub const DEFAULT_SUFFIX: &str = "_watermarked";
pub const DEFAULT_OUTPUT_FOLDER: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watermark_text: String,
    #[serde(deserialize_with = "deserialize_opacity")]
    pub text_opacity: u8,
    pub watermark_position: Point,
    /// Source size the position was captured on. Only used in relative
    /// position mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_reference: Option<Size>,
    pub output_format: OutputFormat,
    pub output_folder: PathBuf,
    pub file_naming_rule: NamingKind,
    pub custom_prefix: String,
    pub custom_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watermark_text: DEFAULT_TEXT.to_string(),
            text_opacity: DEFAULT_OPACITY_PERCENT,
            watermark_position: Point::default(),
            position_reference: None,
            output_format: OutputFormat::default(),
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            file_naming_rule: NamingKind::default(),
            custom_prefix: DEFAULT_PREFIX.to_string(),
            custom_suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl Settings {
    /// Read settings, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Using default settings");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> WatermarkResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write settings as pretty JSON with four-space indentation.
    pub fn save(&self, path: &Path) -> WatermarkResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, to_pretty_json(self)?)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Explicit position, `None` when unset.
    pub fn position(&self) -> Option<Point> {
        Some(self.watermark_position).filter(|p| !p.is_origin())
    }

    pub fn set_position(&mut self, position: Option<Point>, reference: Option<Size>) {
        self.watermark_position = position.unwrap_or_default();
        self.position_reference = position.and(reference);
    }

    pub fn set_opacity(&mut self, value: i64) {
        self.text_opacity = clamp_opacity(value);
    }

    pub fn naming_rule(&self) -> NamingRule {
        NamingRule::from_parts(self.file_naming_rule, &self.custom_prefix, &self.custom_suffix)
    }

    pub fn watermark_spec(&self) -> WatermarkSpec {
        WatermarkSpec::new(
            self.watermark_text.clone(),
            self.text_opacity as i64,
            self.position(),
        )
    }

    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            format: self.output_format,
            naming_rule: self.naming_rule(),
            destination_folder: self.output_folder.clone(),
        }
    }
}

/// Serialise with the four-space indentation used by the settings and
/// template documents.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> WatermarkResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Accept any JSON number and clamp it into the opacity range.
pub(crate) fn deserialize_opacity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_opacity(value.round() as i64))
}

pub(crate) fn deserialize_opacity_opt<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|v| clamp_opacity(v.round() as i64)))
}
