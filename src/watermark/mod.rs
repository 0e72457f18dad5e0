//! Text watermark engine.
//!
//! Renders a text watermark onto images and maps placement input from a
//! scaled preview back to full-resolution pixels.
//!
//! # Features
//!
//! - **Compositor**: pure render of text onto a copy of the source, with
//!   colour-mode normalisation and alpha flattening for JPEG output
//! - **Coordinate mapping**: preview clicks and corner/center presets
//! - **Fonts**: outline fonts from disk with a built-in bitmap fallback
//! - **Codecs**: PNG (lossless, alpha preserved) and JPEG (quality 95)
//!
//! # Opacity
//!
//! Opacity is a percentage on an inverted scale: 0 % draws fully opaque text
//! and 100 % draws nothing. See [`compositor::text_alpha`].

pub mod codec;
pub mod compositor;
pub mod model;
pub mod position;
pub mod text_renderer;

// Re-export main types for convenience
pub use codec::{decode_file, write_rendered, EncoderFactory, ImageEncoder, JPEG_QUALITY};
pub use compositor::{render, render_file, text_alpha, RenderedImage, SourceImage, TEXT_COLOR};
pub use model::{
    clamp_opacity, NamingKind, NamingRule, OutputFormat, OutputSpec, Point, Size, WatermarkSpec,
    DEFAULT_OPACITY_PERCENT, DEFAULT_TEXT,
};
pub use position::{
    default_position, fit_within, preset_to_source, preview_to_source, resolve_position,
    PositionMode, Preset,
};
pub use text_renderer::{font_size_for, FontFace};
