//! Preview rendering.
//!
//! A preview is a full render of the active image, scaled to fit the preview
//! bounds. The source is decoded fresh each time so that edits to the file on
//! disk show up. [`PreviewScheduler`] runs renders on blocking worker threads
//! and only publishes the result of the most recent request.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::{DynamicImage, RgbaImage};
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{WatermarkError, WatermarkResult};
use crate::watermark::{fit_within, render, FontFace, OutputFormat, Size, SourceImage, WatermarkSpec};

/// A scaled render ready for display.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: RgbaImage,
    /// Displayed size; the coordinate mapper's preview size.
    pub preview_size: Size,
    /// Full resolution size of the source.
    pub source_size: Size,
}

/// Decode `path`, render it, and scale into `bounds`.
pub fn render_preview(
    path: &Path,
    spec: &WatermarkSpec,
    format: OutputFormat,
    font: &FontFace,
    bounds: Size,
) -> WatermarkResult<PreviewFrame> {
    let source = SourceImage::open(path)?;
    render_preview_from(&source, spec, format, font, bounds)
}

pub fn render_preview_from(
    source: &SourceImage,
    spec: &WatermarkSpec,
    format: OutputFormat,
    font: &FontFace,
    bounds: Size,
) -> WatermarkResult<PreviewFrame> {
    let rendered = render(source, spec, format, font);
    let source_size = source.size();
    let preview_size = fit_within(source_size, bounds);
    let image = scale_image(rendered.as_dynamic(), preview_size)?;

    trace!(source = %source_size, preview = %preview_size, "Rendered preview");

    Ok(PreviewFrame {
        image,
        preview_size,
        source_size,
    })
}

/// Bilinear resize to exactly `target`.
fn scale_image(img: &DynamicImage, target: Size) -> WatermarkResult<RgbaImage> {
    let rgba = img.to_rgba8();
    if (rgba.width(), rgba.height()) == (target.width, target.height) {
        return Ok(rgba);
    }

    let src_width = NonZeroU32::new(rgba.width())
        .ok_or_else(|| WatermarkError::Preview("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(rgba.height())
        .ok_or_else(|| WatermarkError::Preview("Source height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target.width)
        .ok_or_else(|| WatermarkError::Preview("Target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target.height)
        .ok_or_else(|| WatermarkError::Preview("Target height is 0".to_string()))?;

    let src_image = Image::from_vec_u8(src_width, src_height, rgba.into_raw(), PixelType::U8x4)
        .map_err(|e| WatermarkError::Preview(format!("Failed to create source image: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Preview(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::Preview("Failed to create output image buffer".to_string()))
}

/// Inputs of one preview render.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub path: PathBuf,
    pub spec: WatermarkSpec,
    pub format: OutputFormat,
    pub bounds: Size,
}

/// Outcome published by the scheduler.
#[derive(Debug)]
pub struct PublishedPreview {
    pub generation: u64,
    pub result: WatermarkResult<PreviewFrame>,
}

/// Runs previews off the calling thread; the latest request wins.
///
/// Every request gets a generation number. A finished render is published
/// only if no newer request has been issued in the meantime.
pub struct PreviewScheduler {
    font: Arc<FontFace>,
    generation: Arc<AtomicU64>,
    slot: Arc<Mutex<Option<PublishedPreview>>>,
}

impl PreviewScheduler {
    pub fn new(font: Arc<FontFace>) -> Self {
        Self {
            font,
            generation: Arc::new(AtomicU64::new(0)),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Generation of the most recent request.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a render. The handle resolves to whether the result was
    /// published. Must be called from within a tokio runtime.
    pub fn request(&self, request: PreviewRequest) -> JoinHandle<bool> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let slot = Arc::clone(&self.slot);
        let font = Arc::clone(&self.font);

        tokio::task::spawn_blocking(move || {
            let result = render_preview(
                &request.path,
                &request.spec,
                request.format,
                &font,
                request.bounds,
            );

            let mut slot = slot.lock();
            let superseded = latest.load(Ordering::SeqCst) != generation
                || slot.as_ref().is_some_and(|p| p.generation > generation);
            if superseded {
                debug!(generation, "Discarding stale preview");
                return false;
            }

            *slot = Some(PublishedPreview { generation, result });
            true
        })
    }

    /// Take the most recently published preview, if any.
    pub fn take_latest(&self) -> Option<PublishedPreview> {
        self.slot.lock().take()
    }
}
