//! Image decoding and encoding.
//!
//! Decoding sniffs the format from file content, so a mislabelled extension
//! still decodes. Encoding goes through the [`ImageEncoder`] trait with one
//! implementation per [`OutputFormat`].

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::PngEncoder as ImagePngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder as _};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::compositor::{flatten_onto_white, RenderedImage};
use super::model::OutputFormat;
use crate::error::{WatermarkError, WatermarkResult};

/// JPEG quality used for every export.
pub const JPEG_QUALITY: u8 = 95;

/// Decode an image file into a pixel buffer.
pub fn decode_file(path: &Path) -> WatermarkResult<DynamicImage> {
    let data = fs::read(path).map_err(|e| WatermarkError::decode(path, e.to_string()))?;
    decode_bytes(&data).map_err(|message| WatermarkError::decode(path, message))
}

/// Decode an in-memory image, guessing the format from its signature.
pub fn decode_bytes(data: &[u8]) -> Result<DynamicImage, String> {
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("failed to detect format: {}", e))?
        .decode()
        .map_err(|e| e.to_string())
}

/// Encodes a rendered image to one output format.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// Encode an RGB8 or RGBA8 image.
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, String>;
}

/// Lossless PNG, keeps alpha when present.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, String> {
        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        let written = match image {
            DynamicImage::ImageRgba8(buf) => encoder.write_image(
                buf.as_raw(),
                buf.width(),
                buf.height(),
                ColorType::Rgba8,
            ),
            other => {
                let buf = other.to_rgb8();
                encoder.write_image(buf.as_raw(), buf.width(), buf.height(), ColorType::Rgb8)
            }
        };
        written.map_err(|e| e.to_string())?;

        Ok(output.into_inner())
    }
}

/// Baseline JPEG at a fixed quality. Alpha is flattened onto white.
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, String> {
        let rgb = if image.color().has_alpha() {
            flatten_onto_white(&image.to_rgba8())
        } else {
            image.to_rgb8()
        };

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, self.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| e.to_string())?;

        Ok(output.into_inner())
    }
}

/// Factory for format encoders.
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Jpeg => Box::new(JpegEncoder::default()),
        }
    }
}

/// Encode a rendered image into `format`.
pub fn encode(image: &RenderedImage, format: OutputFormat) -> Result<Vec<u8>, String> {
    EncoderFactory::create(format).encode(image.as_dynamic())
}

/// Encode and write a rendered image to `path`.
pub fn write_rendered(
    image: &RenderedImage,
    format: OutputFormat,
    path: &Path,
) -> WatermarkResult<()> {
    let data = encode(image, format).map_err(|message| WatermarkError::encode(path, message))?;
    fs::write(path, &data).map_err(|e| WatermarkError::encode(path, e.to_string()))?;
    debug!(path = %path.display(), bytes = data.len(), format = %format, "Wrote image");
    Ok(())
}
