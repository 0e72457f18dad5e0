// Application configuration loaded from YAML

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::watermark::{PositionMode, Size};

pub const DEFAULT_SETTINGS_FILE: &str = "watermark_settings.json";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Settings document written on exit and read on startup.
    pub settings_file: PathBuf,
    /// Directory holding `<name>.json` templates.
    pub templates_dir: PathBuf,
    pub position_mode: PositionMode,
    pub font: FontConfig,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            position_mode: PositionMode::default(),
            font: FontConfig::default(),
            preview: PreviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Preferred outline font file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Probe well-known system font locations.
    pub search_system: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            search_system: true,
        }
    }
}

/// Bounds the preview is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
        }
    }
}

impl PreviewConfig {
    pub fn bounds(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document is all defaults
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load from `path` when given, otherwise use defaults. The result is
    /// validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.settings_file.as_os_str().is_empty() {
            return Err("settings_file cannot be empty".to_string());
        }

        if self.templates_dir.as_os_str().is_empty() {
            return Err("templates_dir cannot be empty".to_string());
        }

        if let Some(path) = &self.font.path {
            if path.as_os_str().is_empty() {
                return Err("font.path cannot be empty when set".to_string());
            }
        }

        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(format!(
                "preview bounds must be positive, got {}x{}",
                self.preview.max_width, self.preview.max_height
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "Unknown log level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
