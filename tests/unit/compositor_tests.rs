// Compositor and codec behaviour through the public API

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use rstest::rstest;
use shirushi::watermark::*;

use super::common::{write_rgb_png, write_rgba_png};

#[test]
fn test_alpha_mapping_for_every_opacity() {
    for p in 0..=100u8 {
        let expected = 255.0 * (1.0 - p as f64 / 100.0);
        let alpha = text_alpha(p) as f64;
        assert!(
            (alpha - expected).abs() <= 0.5,
            "opacity {} gave alpha {}, expected about {}",
            p,
            alpha,
            expected
        );
    }
    assert_eq!(text_alpha(0), 255);
    assert_eq!(text_alpha(100), 0);
}

#[rstest]
#[case(OutputFormat::Png)]
#[case(OutputFormat::Jpeg)]
fn test_render_keeps_dimensions(#[case] format: OutputFormat) {
    let source = SourceImage::new(DynamicImage::ImageRgb8(RgbImage::new(321, 123)));
    let rendered = render(&source, &WatermarkSpec::default(), format, &FontFace::Bitmap);
    assert_eq!(rendered.size(), Size::new(321, 123));
}

#[test]
fn test_png_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_rgb_png(dir.path(), "in.png", 300, 200, [10, 200, 30]);
    let output = dir.path().join("out.png");

    let spec = WatermarkSpec::new("Sample", 25, Some(Point::new(10, 10)));
    let rendered = render_file(&input, &spec, OutputFormat::Png, &FontFace::Bitmap).unwrap();
    write_rendered(&rendered, OutputFormat::Png, &output).unwrap();

    let reread = image::open(&output).unwrap();
    assert_eq!(reread.dimensions(), (300, 200));
    assert_eq!(reread.to_rgb8(), rendered.as_dynamic().to_rgb8());
}

#[test]
fn test_rgba_to_jpeg_blends_toward_white() {
    let dir = tempfile::tempdir().unwrap();
    // Half-transparent black: expect roughly 255 * (1 - 128/255) = 127
    let input = write_rgba_png(dir.path(), "alpha.png", 64, 64, [0, 0, 0, 128]);
    let output = dir.path().join("alpha.jpeg");

    let spec = WatermarkSpec::new("", 0, None);
    let rendered = render_file(&input, &spec, OutputFormat::Jpeg, &FontFace::Bitmap).unwrap();
    assert!(!rendered.has_alpha());
    write_rendered(&rendered, OutputFormat::Jpeg, &output).unwrap();

    let reread = image::open(&output).unwrap();
    assert!(!reread.color().has_alpha());
    let p = reread.to_rgb8().get_pixel(32, 32).0;
    for c in p {
        assert!((c as i32 - 127).abs() <= 3, "channel {} not near 127", c);
    }
}

#[test]
fn test_render_file_undecodable_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = super::common::write_corrupt(dir.path(), "bad.png");

    let err = render_file(&path, &WatermarkSpec::default(), OutputFormat::Png, &FontFace::Bitmap)
        .unwrap_err();
    assert!(err.is_per_image());
}

#[test]
fn test_default_placement_on_1000x800() {
    assert_eq!(default_position(Size::new(1000, 800)), Point::new(850, 750));

    let source = SourceImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        1000,
        800,
        Rgb([255, 255, 255]),
    )));
    let rendered = render(
        &source,
        &WatermarkSpec::new("X", 0, None),
        OutputFormat::Png,
        &FontFace::Bitmap,
    )
    .as_dynamic()
    .to_rgb8();

    let first_red = rendered
        .enumerate_pixels()
        .find(|(_, _, p)| **p == Rgb([255, 0, 0]))
        .map(|(x, y, _)| (x, y))
        .unwrap();
    assert!(first_red.0 >= 850 && first_red.1 >= 750);
}

#[test]
fn test_click_mapping_example() {
    let mapped = preview_to_source(
        Point::new(100, 100),
        Some(Size::new(500, 400)),
        Size::new(1000, 800),
    );
    assert_eq!(mapped, Some(Point::new(200, 200)));
}
