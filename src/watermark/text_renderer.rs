//! Text rasterisation into a transparent layer.
//!
//! Fonts resolve in two tiers: an outline font loaded from disk (the
//! configured path first, then a list of well-known system locations), and a
//! built-in 8x8 bitmap font that always succeeds. The bitmap font only covers
//! Latin and Greek; other characters are drawn as `?`.
//!
//! # Example
//!
//! ```
//! use image::Rgb;
//! use shirushi::watermark::text_renderer::{render_text, FontFace};
//!
//! let layer = render_text(&FontFace::Bitmap, "Sample", 16, Rgb([255, 0, 0]), 128).unwrap();
//! assert!(layer.width() > 0);
//! ```

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::{Rgb, Rgba, RgbaImage};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::model::Size;
use crate::error::{WatermarkError, WatermarkResult};

/// Smallest font size ever used, in pixels.
pub const MIN_FONT_SIZE: u32 = 12;

/// Padding added around measured text.
const TEXT_PADDING: u32 = 2;

/// Bitmap glyph cell size.
const BITMAP_CELL: u32 = 8;

/// Locations probed for an outline font when none is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "simhei.ttf",
    "C:\\Windows\\Fonts\\simhei.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font size for an image: one twentieth of the shorter side, at least 12.
pub fn font_size_for(image: Size) -> u32 {
    (image.min_side() / 20).max(MIN_FONT_SIZE)
}

/// A loaded font.
pub enum FontFace {
    /// TrueType/OpenType font read from disk.
    Outline { font: FontVec, path: PathBuf },
    /// Built-in 8x8 bitmap font, scaled by whole pixels.
    Bitmap,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline { path, .. } => f.debug_tuple("Outline").field(path).finish(),
            Self::Bitmap => f.write_str("Bitmap"),
        }
    }
}

impl FontFace {
    /// Load an outline font file.
    pub fn load(path: &Path) -> WatermarkResult<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            WatermarkError::config(format!("invalid font file {}: {}", path.display(), e))
        })?;
        Ok(Self::Outline {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Resolve the best available font.
    ///
    /// Tries `preferred`, then the system candidates when `search_system` is
    /// set, and settles on the bitmap font.
    pub fn resolve(preferred: Option<&Path>, search_system: bool) -> Self {
        if let Some(path) = preferred {
            match Self::load(path) {
                Ok(face) => return face,
                Err(e) => warn!(path = %path.display(), error = %e, "Configured font unavailable"),
            }
        }

        if search_system {
            for candidate in SYSTEM_FONT_CANDIDATES {
                let path = Path::new(candidate);
                if !path.is_file() {
                    continue;
                }
                if let Ok(face) = Self::load(path) {
                    debug!(path = %path.display(), "Using system font");
                    return face;
                }
            }
        }

        debug!("No outline font found, using bitmap font");
        Self::Bitmap
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap)
    }

    /// Short human-readable name.
    pub fn describe(&self) -> String {
        match self {
            Self::Outline { path, .. } => path.display().to_string(),
            Self::Bitmap => "built-in bitmap".to_string(),
        }
    }
}

/// Dimensions of `text` rendered at `font_size`, padding included.
pub fn measure_text(face: &FontFace, text: &str, font_size: u32) -> Size {
    match face {
        FontFace::Outline { font, .. } => {
            let scaled = font.as_scaled(PxScale::from(font_size as f32));
            let mut width = 0.0f32;
            let mut prev: Option<GlyphId> = None;

            for c in text.chars() {
                let id = scaled.glyph_id(c);
                if let Some(prev) = prev {
                    width += scaled.kern(prev, id);
                }
                width += scaled.h_advance(id);
                prev = Some(id);
            }

            Size::new(
                width.ceil().max(0.0) as u32 + TEXT_PADDING,
                scaled.height().ceil().max(0.0) as u32 + TEXT_PADDING,
            )
        }
        FontFace::Bitmap => {
            let scale = bitmap_scale(font_size);
            let glyphs = text.chars().count() as u32;
            Size::new(
                glyphs * BITMAP_CELL * scale + TEXT_PADDING,
                BITMAP_CELL * scale + TEXT_PADDING,
            )
        }
    }
}

/// Render `text` into a transparent layer whose top-left is the text origin.
///
/// Every drawn pixel has the given color and an alpha of
/// `round(coverage * alpha)`. Returns `None` for empty text.
pub fn render_text(
    face: &FontFace,
    text: &str,
    font_size: u32,
    color: Rgb<u8>,
    alpha: u8,
) -> Option<RgbaImage> {
    if text.is_empty() {
        return None;
    }

    let size = measure_text(face, text, font_size);
    let mut layer = RgbaImage::new(size.width.max(1), size.height.max(1));

    match face {
        FontFace::Outline { font, .. } => {
            draw_outline(&mut layer, font, text, font_size, color, alpha)
        }
        FontFace::Bitmap => draw_bitmap(&mut layer, text, font_size, color, alpha),
    }

    Some(layer)
}

fn draw_outline(
    layer: &mut RgbaImage,
    font: &FontVec,
    text: &str,
    font_size: u32,
    color: Rgb<u8>,
    alpha: u8,
) {
    let scale = PxScale::from(font_size as f32);
    let scaled = font.as_scaled(scale);
    let baseline_y = scaled.ascent();
    let (width, height) = (layer.width() as i32, layer.height() as i32);

    let mut cursor_x = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && x < width && y < height {
                    let a = (coverage.clamp(0.0, 1.0) * alpha as f32).round() as u8;
                    stamp(layer, x as u32, y as u32, color, a);
                }
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
}

fn draw_bitmap(layer: &mut RgbaImage, text: &str, font_size: u32, color: Rgb<u8>, alpha: u8) {
    let scale = bitmap_scale(font_size);
    let cell = BITMAP_CELL * scale;

    for (index, c) in text.chars().enumerate() {
        let origin_x = index as u32 * cell;
        for (row, bits) in bitmap_glyph(c).iter().enumerate() {
            for col in 0..BITMAP_CELL {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let base_x = origin_x + col * scale;
                let base_y = row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (x, y) = (base_x + dx, base_y + dy);
                        if x < layer.width() && y < layer.height() {
                            stamp(layer, x, y, color, alpha);
                        }
                    }
                }
            }
        }
    }
}

fn bitmap_scale(font_size: u32) -> u32 {
    (font_size / BITMAP_CELL).max(1)
}

fn bitmap_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Write a text pixel. The color is uniform, so overlapping glyph edges keep
/// the stronger coverage.
fn stamp(layer: &mut RgbaImage, x: u32, y: u32, color: Rgb<u8>, alpha: u8) {
    let existing = layer.get_pixel(x, y)[3];
    if alpha > existing {
        layer.put_pixel(x, y, Rgba([color[0], color[1], color[2], alpha]));
    }
}
