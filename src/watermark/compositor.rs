//! Watermark compositor.
//!
//! Renders the watermark text onto a copy of a source image. The source is
//! never modified; every call produces a fresh buffer in RGB8 or RGBA8.
//!
//! # Colour handling
//!
//! - Any decoded colour type (grey, 16-bit, float) is normalised to RGB8 or
//!   RGBA8 first.
//! - When the output format cannot carry transparency and the source has
//!   alpha, the image is flattened onto opaque white before the text is drawn.
//! - The text is drawn in red with non-premultiplied "over" blending.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use shirushi::watermark::compositor::{render, SourceImage};
//! use shirushi::watermark::text_renderer::FontFace;
//! use shirushi::watermark::{OutputFormat, WatermarkSpec};
//!
//! let source = SourceImage::new(DynamicImage::ImageRgb8(RgbImage::new(400, 300)));
//! let spec = WatermarkSpec::new("Sample", 0, None);
//! let rendered = render(&source, &spec, OutputFormat::Png, &FontFace::Bitmap);
//! assert_eq!(rendered.size(), source.size());
//! ```

use image::{DynamicImage, ImageBuffer, Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::trace;

use super::codec;
use super::model::{OutputFormat, Point, Size, WatermarkSpec};
use super::position::default_position;
use super::text_renderer::{font_size_for, render_text, FontFace};
use crate::error::WatermarkResult;

/// Watermark text colour.
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Text alpha for an opacity percentage: `round(255 * (1 - p / 100))`.
///
/// The scale is inverted: 0 % is opaque text, 100 % is invisible.
///
/// Rounding is on the exact decimal value, half up. At 90 % that gives 26
/// (25.5), where `f64` evaluation would give 25 (25.4999...).
pub fn text_alpha(opacity_percent: u8) -> u8 {
    let p = opacity_percent.min(100) as u32;
    ((255 * (100 - p) + 50) / 100) as u8
}

/// A decoded source image. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    path: Option<PathBuf>,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image, path: None }
    }

    /// Decode an image file.
    pub fn open(path: &Path) -> WatermarkResult<Self> {
        let image = codec::decode_file(path)?;
        Ok(Self {
            image,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Result of a render: RGBA8 for PNG output of a source with alpha, RGB8
/// otherwise. Same dimensions as the source.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    image: DynamicImage,
}

impl RenderedImage {
    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

/// Render the watermark onto a copy of `source`.
pub fn render(
    source: &SourceImage,
    spec: &WatermarkSpec,
    format: OutputFormat,
    font: &FontFace,
) -> RenderedImage {
    let size = source.size();
    let position = spec.position.unwrap_or_else(|| default_position(size));
    let font_size = font_size_for(size);
    let layer = render_text(
        font,
        &spec.text,
        font_size,
        TEXT_COLOR,
        text_alpha(spec.opacity_percent()),
    );

    trace!(
        size = %size,
        position = %position,
        font_size,
        format = %format,
        "Rendering watermark"
    );

    let image = if source.has_alpha() && format.supports_transparency() {
        let mut canvas = source.image.to_rgba8();
        if let Some(layer) = &layer {
            blend_layer(&mut canvas, layer, position);
        }
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = if source.has_alpha() {
            flatten_onto_white(&source.image.to_rgba8())
        } else {
            source.image.to_rgb8()
        };
        if let Some(layer) = &layer {
            blend_layer(&mut canvas, layer, position);
        }
        DynamicImage::ImageRgb8(canvas)
    };

    RenderedImage { image }
}

/// Decode `path` and render the watermark onto it.
pub fn render_file(
    path: &Path,
    spec: &WatermarkSpec,
    format: OutputFormat,
    font: &FontFace,
) -> WatermarkResult<RenderedImage> {
    let source = SourceImage::open(path)?;
    Ok(render(&source, spec, format, font))
}

/// Composite an RGBA buffer onto opaque white, dropping the alpha channel.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let flatten = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
        Rgb([flatten(p[0]), flatten(p[1]), flatten(p[2])])
    })
}

/// Blend `layer` onto `target` with its top-left at `origin`, clipping to
/// the target bounds.
fn blend_layer<P>(target: &mut ImageBuffer<P, Vec<u8>>, layer: &RgbaImage, origin: Point)
where
    P: Pixel<Subpixel = u8>,
{
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;
    let (ox, oy) = (origin.x as i64, origin.y as i64);

    let x_start = ox.max(0);
    let y_start = oy.max(0);
    let x_end = (ox + layer.width() as i64).min(target_width);
    let y_end = (oy + layer.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = layer.get_pixel((tx - ox) as u32, (ty - oy) as u32);
            if fg[3] == 0 {
                continue;
            }
            let bg = target.get_pixel_mut(tx as u32, ty as u32);
            blend_over(bg.channels_mut(), fg);
        }
    }
}

/// Porter-Duff "over" of `fg` onto `bg` (3 or 4 channels), in place.
fn blend_over(bg: &mut [u8], fg: &Rgba<u8>) {
    let fg_alpha = fg[3] as f32 / 255.0;
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;

    if bg.len() < 4 {
        for (c, &f) in bg.iter_mut().zip(fg.0.iter()) {
            let b = *c as f32 / 255.0;
            *c = to_u8(f as f32 / 255.0 * fg_alpha + b * (1.0 - fg_alpha));
        }
        return;
    }

    let bg_alpha = bg[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);
    if out_alpha < 0.001 {
        bg.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }

    for (c, &f) in bg.iter_mut().take(3).zip(fg.0.iter()) {
        let b = *c as f32 / 255.0;
        *c = to_u8((f as f32 / 255.0 * fg_alpha + b * bg_alpha * (1.0 - fg_alpha)) / out_alpha);
    }
    bg[3] = to_u8(out_alpha);
}
