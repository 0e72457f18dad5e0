//! Coordinate mapping between the preview and the full-resolution image.
//!
//! The preview shows the active image scaled down (or up) with its aspect
//! ratio preserved. Placement input arrives in that preview's pixel space and
//! has to be translated into source pixels before rendering.
//!
//! # Placement footprint
//!
//! Both the default placement and the presets assume a fixed 150x50 pixel
//! watermark footprint, independent of the text actually rendered:
//!
//! | Preset      | Preview-space anchor        |
//! |-------------|-----------------------------|
//! | TopLeft     | `(20, 20)`                  |
//! | TopRight    | `(w - 150, 20)`             |
//! | BottomLeft  | `(20, h - 50)`              |
//! | BottomRight | `(w - 150, h - 50)`         |
//! | Center      | `(w - 75, h - 25)`          |
//!
//! # Example
//!
//! ```
//! use shirushi::watermark::position::preview_to_source;
//! use shirushi::watermark::{Point, Size};
//!
//! let source = preview_to_source(
//!     Point::new(100, 100),
//!     Some(Size::new(500, 400)),
//!     Size::new(1000, 800),
//! );
//! assert_eq!(source, Some(Point::new(200, 200)));
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::model::{Point, Size};
use crate::error::WatermarkError;

/// Assumed watermark footprint width in pixels.
pub const FOOTPRINT_WIDTH: i32 = 150;

/// Assumed watermark footprint height in pixels.
pub const FOOTPRINT_HEIGHT: i32 = 50;

/// Inset of the top/left presets from the preview edge.
pub const PRESET_INSET: i32 = 20;

/// Preset placements offered next to the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::TopLeft,
        Preset::TopRight,
        Preset::BottomLeft,
        Preset::BottomRight,
        Preset::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }

    /// Anchor of this preset in preview pixels.
    pub fn preview_anchor(&self, preview: Size) -> Point {
        let w = preview.width as i32;
        let h = preview.height as i32;

        match self {
            Self::TopLeft => Point::new(PRESET_INSET, PRESET_INSET),
            Self::TopRight => Point::new(w - FOOTPRINT_WIDTH, PRESET_INSET),
            Self::BottomLeft => Point::new(PRESET_INSET, h - FOOTPRINT_HEIGHT),
            Self::BottomRight => Point::new(w - FOOTPRINT_WIDTH, h - FOOTPRINT_HEIGHT),
            Self::Center => Point::new(w - FOOTPRINT_WIDTH / 2, h - FOOTPRINT_HEIGHT / 2),
        }
    }
}

impl FromStr for Preset {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                WatermarkError::config(format!(
                    "unknown preset '{}', expected one of top-left, top-right, bottom-left, bottom-right, center",
                    s
                ))
            })
    }
}

/// How a captured position is applied to images of other sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Same pixel offset on every image, whatever its size.
    #[default]
    Fixed,
    /// Same relative position: rescaled from the size it was captured on.
    Relative,
}

/// Default placement when no position is set: a fixed offset from the
/// bottom-right corner. Not clamped; small images clip the text.
pub fn default_position(image: Size) -> Point {
    Point::new(
        image.width as i32 - FOOTPRINT_WIDTH,
        image.height as i32 - FOOTPRINT_HEIGHT,
    )
}

/// Per-axis factors converting preview pixels into source pixels.
///
/// Returns `None` if there is no usable preview.
pub fn scale_factors(preview: Option<Size>, source: Size) -> Option<(f64, f64)> {
    let preview = preview.filter(|p| !p.is_empty())?;
    Some((
        source.width as f64 / preview.width as f64,
        source.height as f64 / preview.height as f64,
    ))
}

/// Map a click in preview pixels to source pixels, rounding to nearest.
pub fn preview_to_source(click: Point, preview: Option<Size>, source: Size) -> Option<Point> {
    let (scale_x, scale_y) = scale_factors(preview, source)?;
    Some(Point::new(
        (click.x as f64 * scale_x).round() as i32,
        (click.y as f64 * scale_y).round() as i32,
    ))
}

/// Resolve a preset into source pixels.
///
/// The anchor is computed in preview space and then scaled; the scaled value
/// is truncated toward zero.
pub fn preset_to_source(preset: Preset, preview: Option<Size>, source: Size) -> Option<Point> {
    let preview_size = preview.filter(|p| !p.is_empty())?;
    let (scale_x, scale_y) = scale_factors(Some(preview_size), source)?;
    let anchor = preset.preview_anchor(preview_size);
    Some(Point::new(
        (anchor.x as f64 * scale_x) as i32,
        (anchor.y as f64 * scale_y) as i32,
    ))
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// Scales both down and up. Each side is at least one pixel.
pub fn fit_within(source: Size, bounds: Size) -> Size {
    if source.is_empty() || bounds.is_empty() {
        return Size::new(bounds.width.max(1), bounds.height.max(1));
    }

    let scale = (bounds.width as f64 / source.width as f64)
        .min(bounds.height as f64 / source.height as f64);

    Size::new(
        ((source.width as f64 * scale).round() as u32).clamp(1, bounds.width),
        ((source.height as f64 * scale).round() as u32).clamp(1, bounds.height),
    )
}

/// Position to use on `target` for a point captured against `reference`.
///
/// In `Fixed` mode, or when the reference size is unknown, the point is used
/// as-is.
pub fn resolve_position(
    position: Point,
    reference: Option<Size>,
    target: Size,
    mode: PositionMode,
) -> Point {
    match (mode, reference) {
        (PositionMode::Relative, Some(reference)) if !reference.is_empty() => Point::new(
            (position.x as f64 * target.width as f64 / reference.width as f64).round() as i32,
            (position.y as f64 * target.height as f64 / reference.height as f64).round() as i32,
        ),
        _ => position,
    }
}
