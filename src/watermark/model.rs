//! Watermark and output parameter types.
//!
//! These are plain values: the controller owns the mutable copy and hands
//! snapshots to the compositor and the export driver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::WatermarkError;

/// Default watermark text.
pub const DEFAULT_TEXT: &str = "水印";

/// Default opacity percentage (inverted scale, see [`text_alpha`](super::compositor::text_alpha)).
pub const DEFAULT_OPACITY_PERCENT: u8 = 50;

/// Highest accepted opacity percentage.
pub const MAX_OPACITY_PERCENT: u8 = 100;

/// A pixel coordinate. May be negative or beyond the image; drawing clips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `(0, 0)` is how the settings document spells "unset".
    pub fn is_origin(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = WatermarkError;

    /// Parses `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| WatermarkError::config(format!("expected WIDTHxHEIGHT, got '{}'", s)))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| WatermarkError::config(format!("invalid width in '{}'", s)))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| WatermarkError::config(format!("invalid height in '{}'", s)))?;
        Ok(Size::new(width, height))
    }
}

/// Text, opacity and placement of the watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSpec {
    /// Text to draw. Empty text renders nothing.
    pub text: String,
    opacity_percent: u8,
    /// Top-left of the text in source pixels. `None` selects the default
    /// bottom-right placement.
    pub position: Option<Point>,
}

impl WatermarkSpec {
    pub fn new(text: impl Into<String>, opacity_percent: i64, position: Option<Point>) -> Self {
        Self {
            text: text.into(),
            opacity_percent: clamp_opacity(opacity_percent),
            position,
        }
    }

    /// Opacity percentage in `[0, 100]`. 0 is opaque text, 100 invisible.
    pub fn opacity_percent(&self) -> u8 {
        self.opacity_percent
    }

    pub fn set_opacity_percent(&mut self, value: i64) {
        self.opacity_percent = clamp_opacity(value);
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT, DEFAULT_OPACITY_PERCENT as i64, None)
    }
}

/// Clamp any integer into the accepted opacity range.
pub fn clamp_opacity(value: i64) -> u8 {
    value.clamp(0, MAX_OPACITY_PERCENT as i64) as u8
}

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Name as stored in settings and templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
        }
    }

    /// File extension: the lowercased format name.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn supports_transparency(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            _ => Err(WatermarkError::config(format!(
                "unknown output format '{}', expected PNG or JPEG",
                s
            ))),
        }
    }
}

/// Which naming rule is active, as persisted in settings and templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingKind {
    #[default]
    Original,
    Prefix,
    Suffix,
}

impl FromStr for NamingKind {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" | "keep" => Ok(NamingKind::Original),
            "prefix" => Ok(NamingKind::Prefix),
            "suffix" => Ok(NamingKind::Suffix),
            _ => Err(WatermarkError::config(format!(
                "unknown naming rule '{}', expected original, prefix or suffix",
                s
            ))),
        }
    }
}

/// Maps an original base name to an output base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamingRule {
    #[default]
    KeepOriginal,
    Prefix(String),
    Suffix(String),
}

impl NamingRule {
    /// Build the active rule from its persisted parts.
    pub fn from_parts(kind: NamingKind, prefix: &str, suffix: &str) -> Self {
        match kind {
            NamingKind::Original => Self::KeepOriginal,
            NamingKind::Prefix => Self::Prefix(prefix.to_string()),
            NamingKind::Suffix => Self::Suffix(suffix.to_string()),
        }
    }

    pub fn kind(&self) -> NamingKind {
        match self {
            Self::KeepOriginal => NamingKind::Original,
            Self::Prefix(_) => NamingKind::Prefix,
            Self::Suffix(_) => NamingKind::Suffix,
        }
    }

    pub fn apply(&self, base_name: &str) -> String {
        match self {
            Self::KeepOriginal => base_name.to_string(),
            Self::Prefix(prefix) => format!("{}{}", prefix, base_name),
            Self::Suffix(suffix) => format!("{}{}", base_name, suffix),
        }
    }

    /// Output file name: renamed base plus the format extension.
    pub fn output_file_name(&self, base_name: &str, format: OutputFormat) -> String {
        format!("{}.{}", self.apply(base_name), format.extension())
    }
}

/// Where and how rendered images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub naming_rule: NamingRule,
    pub destination_folder: PathBuf,
}

impl OutputSpec {
    /// Destination path for a given source file.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let base_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.destination_folder
            .join(self.naming_rule.output_file_name(&base_name, self.format))
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            naming_rule: NamingRule::KeepOriginal,
            destination_folder: PathBuf::from("output"),
        }
    }
}
