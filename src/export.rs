//! Batch export.
//!
//! Renders every image at full resolution and writes it to the destination
//! folder. A failing image is recorded and skipped; the batch continues.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{WatermarkError, WatermarkResult};
use crate::watermark::{
    render, resolve_position, write_rendered, FontFace, OutputSpec, PositionMode, Size,
    SourceImage, WatermarkSpec,
};

/// How the watermark position carries over between images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub mode: PositionMode,
    /// Size of the image the position was captured on.
    pub reference: Option<Size>,
}

impl Placement {
    /// The watermark spec to draw on an image of `target` size.
    pub fn spec_for(&self, spec: &WatermarkSpec, target: Size) -> WatermarkSpec {
        let mut placed = spec.clone();
        placed.position = spec
            .position
            .map(|p| resolve_position(p, self.reference, target, self.mode));
        placed
    }
}

/// Progress of a running export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress<'a> {
    /// Zero-based index of the image about to be processed.
    pub index: usize,
    pub total: usize,
    pub source: &'a Path,
}

#[derive(Debug)]
pub struct ExportFailure {
    pub source: PathBuf,
    pub error: WatermarkError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    /// Output paths written, in processing order.
    pub exported: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.exported.len() + self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Export `images` with the given watermark and output settings.
///
/// Only failing to create the destination folder aborts the batch. Every
/// other error is scoped to its image and lands in the report.
pub fn export_batch<F>(
    images: &[PathBuf],
    spec: &WatermarkSpec,
    output: &OutputSpec,
    placement: Placement,
    font: &FontFace,
    mut on_progress: F,
) -> WatermarkResult<ExportReport>
where
    F: FnMut(ExportProgress<'_>),
{
    fs::create_dir_all(&output.destination_folder)?;

    let mut report = ExportReport::default();
    let total = images.len();

    for (index, source) in images.iter().enumerate() {
        on_progress(ExportProgress {
            index,
            total,
            source,
        });

        match export_one(source, spec, output, placement, font) {
            Ok(target) => report.exported.push(target),
            Err(error) => {
                warn!(source = %source.display(), error = %error, "Export failed, skipping image");
                report.failures.push(ExportFailure {
                    source: source.clone(),
                    error,
                });
            }
        }
    }

    info!(
        exported = report.exported.len(),
        failed = report.failures.len(),
        destination = %output.destination_folder.display(),
        "Export finished"
    );
    Ok(report)
}

fn export_one(
    source_path: &Path,
    spec: &WatermarkSpec,
    output: &OutputSpec,
    placement: Placement,
    font: &FontFace,
) -> WatermarkResult<PathBuf> {
    let source = SourceImage::open(source_path)?;

    let image_spec = placement.spec_for(spec, source.size());
    let rendered = render(&source, &image_spec, output.format, font);
    let target = output.output_path(source_path);
    write_rendered(&rendered, output.format, &target)?;
    Ok(target)
}
