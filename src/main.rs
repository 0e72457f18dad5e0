use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use shirushi::config::AppConfig;
use shirushi::controller::{Command, Controller, Notice};
use shirushi::watermark::{
    preset_to_source, preview_to_source, NamingKind, OutputFormat, Point, Preset, Size,
};
use std::path::PathBuf;

/// Shirushi - batch text watermarking with preview and templates
#[derive(Parser, Debug)]
#[command(name = "shirushi")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Render one image at full resolution
    Render {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Render a scaled preview of one image
    Preview {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Watermark files and folders into the output folder
    Export {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Map a preview click or preset to source pixels
    Place {
        /// Displayed preview size, e.g. 500x400
        #[arg(long)]
        preview: Size,
        /// Source image size, e.g. 1000x800
        #[arg(long)]
        source: Size,
        /// Click position in preview pixels, e.g. 100,100
        #[arg(long, value_parser = parse_point, conflicts_with = "preset", required_unless_present = "preset")]
        click: Option<Point>,
        #[arg(long)]
        preset: Option<Preset>,
        /// Store the result as the watermark position
        #[arg(long)]
        save: bool,
    },
    /// Manage templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Inspect persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    List,
    Save { name: String },
    Load { name: String },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
}

#[derive(Args, Debug, Default)]
struct Overrides {
    /// Watermark text
    #[arg(long)]
    text: Option<String>,
    /// Opacity percentage, 0 (opaque) to 100 (invisible)
    #[arg(long, allow_negative_numbers = true)]
    opacity: Option<i64>,
    /// Position in source pixels (requires --y)
    #[arg(long, requires = "y", allow_negative_numbers = true)]
    x: Option<i32>,
    #[arg(long, requires = "x", allow_negative_numbers = true)]
    y: Option<i32>,
    /// Output format: png or jpeg
    #[arg(long)]
    format: Option<OutputFormat>,
    /// File naming rule: original, prefix or suffix
    #[arg(long)]
    naming: Option<NamingKind>,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    suffix: Option<String>,
    /// Output folder
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl Overrides {
    fn into_commands(self) -> Vec<Command> {
        let mut commands = Vec::new();
        if let Some(text) = self.text {
            commands.push(Command::TextChanged(text));
        }
        if let Some(opacity) = self.opacity {
            commands.push(Command::OpacityChanged(opacity));
        }
        if let (Some(x), Some(y)) = (self.x, self.y) {
            commands.push(Command::PositionChanged(Some(Point::new(x, y))));
        }
        if let Some(format) = self.format {
            commands.push(Command::FormatChanged(format));
        }
        if let Some(naming) = self.naming {
            commands.push(Command::NamingRuleChanged(naming));
        }
        if let Some(prefix) = self.prefix {
            commands.push(Command::PrefixChanged(prefix));
        }
        if let Some(suffix) = self.suffix {
            commands.push(Command::SuffixChanged(suffix));
        }
        if let Some(folder) = self.out_dir {
            commands.push(Command::OutputFolderChanged(folder));
        }
        commands
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse().map_err(|_| format!("invalid x in '{}'", s))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y in '{}'", s))?;
    Ok(Point::new(x, y))
}

/// Print notices and report whether any was a warning.
fn report(notices: Vec<Notice>) -> bool {
    let mut warned = false;
    for notice in notices {
        match notice {
            Notice::Status(message) => println!("{}", message),
            Notice::Warning(message) => {
                warned = true;
                eprintln!("warning: {}", message);
            }
            Notice::PreviewUpdated {
                preview_size,
                source_size,
            } => tracing::debug!(%preview_size, %source_size, "Preview updated"),
            Notice::ExportFinished(report) => {
                for path in &report.exported {
                    println!("{}", path.display());
                }
            }
            Notice::TemplatesChanged(names) => {
                tracing::debug!(count = names.len(), "Templates changed")
            }
        }
    }
    warned
}

fn apply(controller: &mut Controller, overrides: Overrides) -> bool {
    let mut warned = false;
    for command in overrides.into_commands() {
        warned |= report(controller.dispatch(command));
    }
    warned
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    shirushi::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(
        settings_file = %config.settings_file.display(),
        templates_dir = %config.templates_dir.display(),
        position_mode = ?config.position_mode,
        "Configuration loaded"
    );

    let mut controller = Controller::from_config(&config);
    let mut persist = true;
    let mut failed = false;

    match cli.command {
        CliCommand::Render {
            image,
            output,
            overrides,
        } => {
            failed |= apply(&mut controller, overrides);
            controller
                .render_to(&image, &output)
                .with_context(|| format!("Failed to render {}", image.display()))?;
            println!("{}", output.display());
        }
        CliCommand::Preview {
            image,
            output,
            width,
            height,
            overrides,
        } => {
            let bounds = config.preview.bounds();
            controller.set_preview_bounds(Size::new(
                width.unwrap_or(bounds.width),
                height.unwrap_or(bounds.height),
            ));
            failed |= apply(&mut controller, overrides);
            report(controller.dispatch(Command::ImagesAdded(vec![image.clone()])));

            let frame = controller
                .preview()
                .ok_or_else(|| anyhow!("No preview produced for {}", image.display()))?;
            frame
                .image
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} ({} of {})", output.display(), frame.preview_size, frame.source_size);
        }
        CliCommand::Export { paths, overrides } => {
            failed |= apply(&mut controller, overrides);
            report(controller.dispatch(Command::ImagesAdded(paths)));
            failed |= report(controller.dispatch(Command::ExportRequested));
        }
        CliCommand::Place {
            preview,
            source,
            click,
            preset,
            save,
        } => {
            persist = save;
            let mapped = match (click, preset) {
                (Some(click), _) => preview_to_source(click, Some(preview), source),
                (None, Some(preset)) => preset_to_source(preset, Some(preview), source),
                (None, None) => bail!("either --click or --preset is required"),
            };
            let position =
                mapped.ok_or_else(|| anyhow!("preview size {} is empty", preview))?;
            println!("{},{}", position.x, position.y);

            if save {
                let mut settings = controller.settings().clone();
                settings.set_position(Some(position), Some(source));
                settings
                    .save(&config.settings_file)
                    .context("Failed to save settings")?;
                persist = false;
            }
        }
        CliCommand::Template { action } => match action {
            TemplateAction::List => {
                persist = false;
                for name in controller.list_templates()? {
                    println!("{}", name);
                }
            }
            TemplateAction::Save { name } => {
                persist = false;
                failed |= report(controller.dispatch(Command::TemplateSaved(name)));
            }
            TemplateAction::Load { name } => {
                failed |= report(controller.dispatch(Command::TemplateLoaded(name)));
            }
            TemplateAction::Delete { name } => {
                persist = false;
                failed |= report(controller.dispatch(Command::TemplateDeleted(name)));
            }
        },
        CliCommand::Settings { action } => match action {
            SettingsAction::Show => {
                persist = false;
                println!("{}", serde_json::to_string_pretty(controller.settings())?);
            }
        },
    }

    if persist {
        controller
            .save_settings(&config.settings_file)
            .context("Failed to save settings")?;
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
