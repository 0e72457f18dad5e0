//! Session controller.
//!
//! Owns the mutable session state (settings, loaded images, current preview)
//! and turns [`Command`]s into [`Notice`]s. A front end sends commands and
//! renders notices; it never touches the state directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::WatermarkResult;
use crate::export::{export_batch, ExportReport, Placement};
use crate::ingest::collect_images;
use crate::preview::{render_preview_from, PreviewFrame};
use crate::settings::Settings;
use crate::template::{Template, TemplateStore};
use crate::watermark::{
    preset_to_source, preview_to_source, render, write_rendered, FontFace, NamingKind,
    OutputFormat, Point, PositionMode, Preset, Size, SourceImage,
};

/// Input events from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TextChanged(String),
    /// Any integer; clamped into `[0, 100]`.
    OpacityChanged(i64),
    /// Click in preview pixels.
    PreviewClicked(Point),
    /// Drag in preview pixels; treated like a click.
    PreviewDragged(Point),
    PresetSelected(Preset),
    /// Explicit position in source pixels. `None` restores the default.
    PositionChanged(Option<Point>),
    FormatChanged(OutputFormat),
    NamingRuleChanged(NamingKind),
    PrefixChanged(String),
    SuffixChanged(String),
    OutputFolderChanged(PathBuf),
    ImagesAdded(Vec<PathBuf>),
    ImageSelected(usize),
    ExportRequested,
    TemplateSaved(String),
    TemplateLoaded(String),
    TemplateDeleted(String),
}

/// Output events for the front end.
#[derive(Debug)]
pub enum Notice {
    PreviewUpdated {
        preview_size: Size,
        source_size: Size,
    },
    Status(String),
    Warning(String),
    ExportFinished(ExportReport),
    TemplatesChanged(Vec<String>),
}

pub struct Controller {
    settings: Settings,
    images: Vec<PathBuf>,
    active: Option<usize>,
    preview: Option<PreviewFrame>,
    preview_bounds: Size,
    position_mode: PositionMode,
    templates: TemplateStore,
    font: Arc<FontFace>,
}

impl Controller {
    pub fn new(
        settings: Settings,
        templates: TemplateStore,
        font: Arc<FontFace>,
        position_mode: PositionMode,
        preview_bounds: Size,
    ) -> Self {
        Self {
            settings,
            images: Vec::new(),
            active: None,
            preview: None,
            preview_bounds,
            position_mode,
            templates,
            font,
        }
    }

    /// Build a controller from application config: loads the settings file
    /// and resolves the font.
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = Settings::load(&config.settings_file);
        let font = FontFace::resolve(config.font.path.as_deref(), config.font.search_system);
        info!(font = %font.describe(), "Font resolved");

        Self::new(
            settings,
            TemplateStore::new(&config.templates_dir),
            Arc::new(font),
            config.position_mode,
            config.preview.bounds(),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn active_image(&self) -> Option<&Path> {
        self.active.and_then(|i| self.images.get(i)).map(PathBuf::as_path)
    }

    pub fn preview(&self) -> Option<&PreviewFrame> {
        self.preview.as_ref()
    }

    pub fn font(&self) -> &FontFace {
        &self.font
    }

    pub fn set_preview_bounds(&mut self, bounds: Size) {
        self.preview_bounds = bounds;
    }

    pub fn save_settings(&self, path: &Path) -> WatermarkResult<()> {
        self.settings.save(path)
    }

    pub fn list_templates(&self) -> WatermarkResult<Vec<String>> {
        self.templates.list()
    }

    /// Apply one command.
    pub fn dispatch(&mut self, command: Command) -> Vec<Notice> {
        debug!(?command, "Dispatching command");

        match command {
            Command::TextChanged(text) => {
                self.settings.watermark_text = text;
                self.refresh_preview()
            }
            Command::OpacityChanged(value) => {
                self.settings.set_opacity(value);
                self.refresh_preview()
            }
            Command::PreviewClicked(click) | Command::PreviewDragged(click) => {
                let mapped = self.preview.as_ref().and_then(|frame| {
                    preview_to_source(click, Some(frame.preview_size), frame.source_size)
                });
                self.place(mapped)
            }
            Command::PresetSelected(preset) => {
                let mapped = self.preview.as_ref().and_then(|frame| {
                    preset_to_source(preset, Some(frame.preview_size), frame.source_size)
                });
                self.place(mapped)
            }
            Command::PositionChanged(position) => {
                let reference = self.preview.as_ref().map(|frame| frame.source_size);
                self.settings.set_position(position, reference);
                self.refresh_preview()
            }
            Command::FormatChanged(format) => {
                self.settings.output_format = format;
                self.refresh_preview()
            }
            Command::NamingRuleChanged(kind) => {
                self.settings.file_naming_rule = kind;
                Vec::new()
            }
            Command::PrefixChanged(prefix) => {
                self.settings.custom_prefix = prefix;
                Vec::new()
            }
            Command::SuffixChanged(suffix) => {
                self.settings.custom_suffix = suffix;
                Vec::new()
            }
            Command::OutputFolderChanged(folder) => {
                self.settings.output_folder = folder;
                Vec::new()
            }
            Command::ImagesAdded(paths) => self.add_images(&paths),
            Command::ImageSelected(index) => {
                if index >= self.images.len() {
                    return vec![Notice::Warning(format!("No image at index {}", index))];
                }
                self.active = Some(index);
                self.refresh_preview()
            }
            Command::ExportRequested => self.export(),
            Command::TemplateSaved(name) => {
                let template = Template::capture(&self.settings);
                match self.templates.save(&name, &template) {
                    Ok(()) => self.with_template_list(format!("Template '{}' saved", name)),
                    Err(e) => vec![Notice::Warning(format!("Cannot save template '{}': {}", name, e))],
                }
            }
            Command::TemplateLoaded(name) => match self.templates.load(&name) {
                Ok(template) => {
                    template.apply_to(&mut self.settings);
                    let mut notices = self.refresh_preview();
                    notices.push(Notice::Status(format!("Template '{}' loaded", name)));
                    notices
                }
                Err(e) => vec![Notice::Warning(format!("Cannot load template '{}': {}", name, e))],
            },
            Command::TemplateDeleted(name) => match self.templates.delete(&name) {
                Ok(()) => self.with_template_list(format!("Template '{}' deleted", name)),
                Err(e) => vec![Notice::Warning(format!(
                    "Cannot delete template '{}': {}",
                    name, e
                ))],
            },
        }
    }

    /// Render `source` at full resolution to `target` with the current
    /// settings.
    pub fn render_to(&self, source: &Path, target: &Path) -> WatermarkResult<()> {
        let image = SourceImage::open(source)?;
        let spec = self
            .placement()
            .spec_for(&self.settings.watermark_spec(), image.size());
        let format = self.settings.output_format;
        let rendered = render(&image, &spec, format, &self.font);
        write_rendered(&rendered, format, target)
    }

    fn place(&mut self, mapped: Option<Point>) -> Vec<Notice> {
        let Some(position) = mapped else {
            return Vec::new();
        };
        let reference = self.preview.as_ref().map(|frame| frame.source_size);
        self.settings.set_position(Some(position), reference);
        debug!(%position, "Watermark placed");
        self.refresh_preview()
    }

    fn add_images(&mut self, paths: &[PathBuf]) -> Vec<Notice> {
        let before = self.images.len();
        for image in collect_images(paths) {
            if !self.images.contains(&image) {
                self.images.push(image);
            }
        }
        let added = self.images.len() - before;

        let mut notices = vec![Notice::Status(format!("Added {} image(s)", added))];
        if self.active.is_none() && !self.images.is_empty() {
            self.active = Some(0);
            notices.extend(self.refresh_preview());
        }
        notices
    }

    fn refresh_preview(&mut self) -> Vec<Notice> {
        let Some(path) = self.active_image().map(Path::to_path_buf) else {
            return Vec::new();
        };

        let placement = self.placement();
        let frame = SourceImage::open(&path).and_then(|source| {
            let spec = placement.spec_for(&self.settings.watermark_spec(), source.size());
            render_preview_from(
                &source,
                &spec,
                self.settings.output_format,
                &self.font,
                self.preview_bounds,
            )
        });
        match frame {
            Ok(frame) => {
                let notice = Notice::PreviewUpdated {
                    preview_size: frame.preview_size,
                    source_size: frame.source_size,
                };
                self.preview = Some(frame);
                vec![notice, Notice::Status(format!("Preview: {}", display_name(&path)))]
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Preview failed");
                vec![Notice::Status(format!("Cannot preview {}: {}", display_name(&path), e))]
            }
        }
    }

    fn export(&mut self) -> Vec<Notice> {
        if self.images.is_empty() {
            return vec![Notice::Warning("No images to export".to_string())];
        }

        let spec = self.settings.watermark_spec();
        let output = self.settings.output_spec();
        let placement = self.placement();

        let result = export_batch(&self.images, &spec, &output, placement, &self.font, |p| {
            info!(
                "Exporting image {}/{}: {}",
                p.index + 1,
                p.total,
                display_name(p.source)
            );
        });

        match result {
            Ok(report) => {
                let mut notices: Vec<Notice> = report
                    .failures
                    .iter()
                    .map(|f| {
                        Notice::Warning(format!(
                            "Cannot export {}: {}",
                            display_name(&f.source),
                            f.error
                        ))
                    })
                    .collect();
                notices.push(Notice::Status(format!(
                    "Exported {} of {} image(s) to {}",
                    report.exported.len(),
                    report.total(),
                    output.destination_folder.display()
                )));
                notices.push(Notice::ExportFinished(report));
                notices
            }
            Err(e) => vec![Notice::Warning(format!(
                "Cannot create output folder {}: {}",
                output.destination_folder.display(),
                e
            ))],
        }
    }

    fn placement(&self) -> Placement {
        Placement {
            mode: self.position_mode,
            reference: self.settings.position_reference,
        }
    }

    fn with_template_list(&self, status: String) -> Vec<Notice> {
        let mut notices = vec![Notice::Status(status)];
        match self.templates.list() {
            Ok(names) => notices.push(Notice::TemplatesChanged(names)),
            Err(e) => notices.push(Notice::Warning(format!("Cannot list templates: {}", e))),
        }
        notices
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
