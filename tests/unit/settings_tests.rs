// Settings document tests

use shirushi::settings::Settings;
use shirushi::watermark::{NamingKind, OutputFormat, Point};

#[test]
fn test_reads_document_written_by_desktop_app() {
    let json = r#"{
    "watermark_text": "版权所有",
    "text_opacity": 30,
    "watermark_position": {
        "x": 412,
        "y": 96
    },
    "output_format": "JPEG",
    "output_folder": "/tmp/exports",
    "file_naming_rule": "suffix",
    "custom_prefix": "wm_",
    "custom_suffix": "_final"
}"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watermark_settings.json");
    std::fs::write(&path, json).unwrap();

    let settings = Settings::load(&path);
    assert_eq!(settings.watermark_text, "版权所有");
    assert_eq!(settings.text_opacity, 30);
    assert_eq!(settings.position(), Some(Point::new(412, 96)));
    assert_eq!(settings.output_format, OutputFormat::Jpeg);
    assert_eq!(settings.file_naming_rule, NamingKind::Suffix);
    assert_eq!(settings.custom_suffix, "_final");
    assert_eq!(
        settings.output_spec().output_path(std::path::Path::new("a/cat.png")),
        std::path::PathBuf::from("/tmp/exports/cat_final.jpeg")
    );
}

#[test]
fn test_round_trip_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = Settings {
        watermark_text: "Proof".to_string(),
        output_format: OutputFormat::Jpeg,
        file_naming_rule: NamingKind::Prefix,
        custom_prefix: "draft-".to_string(),
        ..Default::default()
    };
    settings.set_opacity(73);
    settings.set_position(Some(Point::new(-10, 40)), None);
    settings.save(&path).unwrap();

    assert_eq!(Settings::try_load(&path).unwrap(), settings);
}

#[test]
fn test_unknown_format_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"output_format": "WEBP"}"#).unwrap();

    assert_eq!(Settings::load(&path), Settings::default());
}
