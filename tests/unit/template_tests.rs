// Template store tests

use shirushi::error::WatermarkError;
use shirushi::settings::Settings;
use shirushi::template::{Template, TemplateStore};
use shirushi::watermark::{NamingKind, OutputFormat};

fn sample_settings() -> Settings {
    let mut settings = Settings {
        watermark_text: "Confidential".to_string(),
        output_format: OutputFormat::Jpeg,
        file_naming_rule: NamingKind::Suffix,
        custom_suffix: "_c".to_string(),
        ..Default::default()
    };
    settings.set_opacity(15);
    settings
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("templates"));

    let template = Template::capture(&sample_settings());
    store.save("confidential", &template).unwrap();

    assert!(dir.path().join("templates/confidential.json").is_file());
    assert_eq!(store.load("confidential").unwrap(), template);

    let mut restored = Settings::default();
    store.load("confidential").unwrap().apply_to(&mut restored);
    assert_eq!(restored.watermark_text, "Confidential");
    assert_eq!(restored.text_opacity, 15);
    assert_eq!(restored.output_format, OutputFormat::Jpeg);
    assert_eq!(restored.file_naming_rule, NamingKind::Suffix);
    assert_eq!(restored.custom_suffix, "_c");
}

#[test]
fn test_list_is_sorted_and_json_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path());
    let template = Template::capture(&Settings::default());

    store.save("zeta", &template).unwrap();
    store.save("alpha", &template).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
}

#[test]
fn test_save_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path());

    store.save("t", &Template::capture(&Settings::default())).unwrap();
    store.save("t", &Template::capture(&sample_settings())).unwrap();

    assert_eq!(
        store.load("t").unwrap().watermark_text.as_deref(),
        Some("Confidential")
    );
    assert_eq!(store.list().unwrap(), vec!["t"]);
}

#[test]
fn test_missing_template() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path());

    assert!(matches!(store.load("ghost"), Err(WatermarkError::NotFound(_))));
    assert!(matches!(store.delete("ghost"), Err(WatermarkError::NotFound(_))));
}

#[test]
fn test_delete_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path());
    store.save("gone", &Template::default()).unwrap();

    store.delete("gone").unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_malformed_template_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "[1, 2").unwrap();
    let store = TemplateStore::new(dir.path());

    assert!(matches!(store.load("broken"), Err(WatermarkError::Config(_))));
}

#[test]
fn test_path_like_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("templates"));

    let err = store
        .save("../outside", &Template::default())
        .unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
    assert!(!dir.path().join("outside.json").exists());
}
