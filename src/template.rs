//! Named watermark templates.
//!
//! A template is a partial settings document stored as `<name>.json` in the
//! templates directory. It carries the text, opacity, format and naming
//! fields; position and output folder are per-session and never stored.
//! Loading applies only the keys that are present.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{WatermarkError, WatermarkResult};
use crate::settings::{deserialize_opacity_opt, to_pretty_json, Settings};
use crate::watermark::{NamingKind, OutputFormat};

const TEMPLATE_EXTENSION: &str = "json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_text: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opacity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_opacity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_naming_rule: Option<NamingKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_suffix: Option<String>,
}

impl Template {
    /// Snapshot the template fields of the current settings.
    pub fn capture(settings: &Settings) -> Self {
        Self {
            watermark_text: Some(settings.watermark_text.clone()),
            text_opacity: Some(settings.text_opacity),
            output_format: Some(settings.output_format),
            file_naming_rule: Some(settings.file_naming_rule),
            custom_prefix: Some(settings.custom_prefix.clone()),
            custom_suffix: Some(settings.custom_suffix.clone()),
        }
    }

    /// Overwrite the fields this template defines.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(text) = &self.watermark_text {
            settings.watermark_text = text.clone();
        }
        if let Some(opacity) = self.text_opacity {
            settings.set_opacity(opacity as i64);
        }
        if let Some(format) = self.output_format {
            settings.output_format = format;
        }
        if let Some(rule) = self.file_naming_rule {
            settings.file_naming_rule = rule;
        }
        if let Some(prefix) = &self.custom_prefix {
            settings.custom_prefix = prefix.clone();
        }
        if let Some(suffix) = &self.custom_suffix {
            settings.custom_suffix = suffix.clone();
        }
    }
}

/// Directory-backed template storage.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template names, sorted. A missing directory holds no templates.
    pub fn list(&self) -> WatermarkResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Write `template` under `name`, replacing any existing one.
    pub fn save(&self, name: &str, template: &Template) -> WatermarkResult<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, to_pretty_json(template)?)?;
        info!(template = name, path = %path.display(), "Saved template");
        Ok(())
    }

    pub fn load(&self, name: &str) -> WatermarkResult<Template> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WatermarkError::NotFound(format!("template '{}'", name)))
            }
            Err(e) => return Err(e.into()),
        };
        let template = serde_json::from_str(&content).map_err(|e| {
            WatermarkError::config(format!("template '{}' is malformed: {}", name, e))
        })?;
        debug!(template = name, "Loaded template");
        Ok(template)
    }

    pub fn delete(&self, name: &str) -> WatermarkResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(template = name, "Deleted template");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(WatermarkError::NotFound(format!("template '{}'", name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, name: &str) -> WatermarkResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, TEMPLATE_EXTENSION)))
    }
}

/// Names become file stems, so they must be a single plain path component.
pub fn validate_name(name: &str) -> WatermarkResult<()> {
    if name.trim().is_empty() {
        return Err(WatermarkError::config("template name cannot be empty"));
    }
    if name.contains(|c: char| matches!(c, '/' | '\\' | '\0')) || name == "." || name == ".." {
        return Err(WatermarkError::config(format!(
            "invalid template name '{}'",
            name
        )));
    }
    Ok(())
}
