// Controller command dispatch tests

use std::path::Path;
use std::sync::Arc;

use shirushi::controller::{Command, Controller, Notice};
use shirushi::settings::Settings;
use shirushi::template::TemplateStore;
use shirushi::watermark::{FontFace, OutputFormat, Point, PositionMode, Preset, Size};

use super::common::{write_corrupt, write_rgb_png};

fn controller(dir: &Path) -> Controller {
    controller_with_mode(dir, PositionMode::Fixed)
}

fn controller_with_mode(dir: &Path, mode: PositionMode) -> Controller {
    let settings = Settings {
        output_folder: dir.join("out"),
        ..Default::default()
    };
    Controller::new(
        settings,
        TemplateStore::new(dir.join("templates")),
        Arc::new(FontFace::Bitmap),
        mode,
        Size::new(100, 100),
    )
}

fn warnings(notices: &[Notice]) -> Vec<&str> {
    notices
        .iter()
        .filter_map(|n| match n {
            Notice::Warning(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_adding_images_selects_first_and_previews() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgb_png(dir.path(), "a.png", 200, 160, [255, 255, 255]);
    let mut controller = controller(dir.path());

    let notices = controller.dispatch(Command::ImagesAdded(vec![image.clone()]));

    assert!(notices.iter().any(|n| matches!(
        n,
        Notice::PreviewUpdated { preview_size, source_size }
            if *preview_size == Size::new(100, 80) && *source_size == Size::new(200, 160)
    )));
    assert_eq!(controller.active_image(), Some(image.as_path()));
    assert_eq!(controller.preview().unwrap().image.dimensions(), (100, 80));
}

#[test]
fn test_click_maps_into_source_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgb_png(dir.path(), "a.png", 200, 160, [255, 255, 255]);
    let mut controller = controller(dir.path());
    controller.dispatch(Command::ImagesAdded(vec![image]));

    controller.dispatch(Command::PreviewClicked(Point::new(50, 40)));
    assert_eq!(controller.settings().position(), Some(Point::new(100, 80)));
    assert_eq!(
        controller.settings().position_reference,
        Some(Size::new(200, 160))
    );

    controller.dispatch(Command::PresetSelected(Preset::TopLeft));
    assert_eq!(controller.settings().position(), Some(Point::new(40, 40)));
}

#[test]
fn test_placement_without_preview_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());

    assert!(controller
        .dispatch(Command::PreviewClicked(Point::new(10, 10)))
        .is_empty());
    assert!(controller
        .dispatch(Command::PresetSelected(Preset::Center))
        .is_empty());
    assert_eq!(controller.settings().position(), None);
}

#[test]
fn test_opacity_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());

    controller.dispatch(Command::OpacityChanged(180));
    assert_eq!(controller.settings().text_opacity, 100);
    controller.dispatch(Command::OpacityChanged(-4));
    assert_eq!(controller.settings().text_opacity, 0);
}

#[test]
fn test_failed_preview_keeps_last_frame() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_rgb_png(dir.path(), "good.png", 200, 160, [0, 0, 0]);
    let bad = write_corrupt(dir.path(), "bad.png");
    let mut controller = controller(dir.path());
    controller.dispatch(Command::ImagesAdded(vec![good, bad]));

    let notices = controller.dispatch(Command::ImageSelected(1));

    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::Status(m) if m.contains("bad.png"))));
    assert_eq!(
        controller.preview().unwrap().source_size,
        Size::new(200, 160)
    );
}

#[test]
fn test_select_out_of_range_warns() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());
    let notices = controller.dispatch(Command::ImageSelected(3));
    assert_eq!(warnings(&notices).len(), 1);
}

#[test]
fn test_export_without_images_warns() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());

    let notices = controller.dispatch(Command::ExportRequested);
    assert_eq!(warnings(&notices), vec!["No images to export"]);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_export_reports_failed_image_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![
        write_rgb_png(dir.path(), "1.png", 60, 60, [255, 255, 255]),
        write_corrupt(dir.path(), "2.png"),
        write_rgb_png(dir.path(), "3.png", 60, 60, [255, 255, 255]),
    ];
    let mut controller = controller(dir.path());
    controller.dispatch(Command::ImagesAdded(images));
    controller.dispatch(Command::FormatChanged(OutputFormat::Jpeg));

    let notices = controller.dispatch(Command::ExportRequested);

    let warned = warnings(&notices);
    assert_eq!(warned.len(), 1);
    assert!(warned[0].contains("2.png"));

    let report = notices
        .iter()
        .find_map(|n| match n {
            Notice::ExportFinished(report) => Some(report),
            _ => None,
        })
        .unwrap();
    assert_eq!(report.exported.len(), 2);
    assert!(dir.path().join("out/1.jpeg").is_file());
    assert!(dir.path().join("out/3.jpeg").is_file());
}

#[test]
fn test_relative_mode_preview_matches_export() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![
        write_rgb_png(dir.path(), "a.png", 200, 200, [255, 255, 255]),
        write_rgb_png(dir.path(), "b.png", 100, 100, [255, 255, 255]),
    ];
    let mut controller = controller_with_mode(dir.path(), PositionMode::Relative);
    controller.dispatch(Command::ImagesAdded(images));
    controller.dispatch(Command::TextChanged("MARK".to_string()));

    controller.dispatch(Command::PreviewClicked(Point::new(80, 80)));
    assert_eq!(controller.settings().position(), Some(Point::new(160, 160)));

    controller.dispatch(Command::ImageSelected(1));
    let preview = controller.preview().unwrap().image.clone();
    assert_eq!(preview.dimensions(), (100, 100));
    assert!(preview.pixels().any(|p| p.0 != [255, 255, 255, 255]));

    let notices = controller.dispatch(Command::ExportRequested);
    assert!(warnings(&notices).is_empty());

    let exported = image::open(dir.path().join("out/b.png")).unwrap().to_rgba8();
    assert_eq!(exported, preview);
}

#[test]
fn test_template_commands() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller(dir.path());

    controller.dispatch(Command::TextChanged("Draft".to_string()));
    let notices = controller.dispatch(Command::TemplateSaved("draft".to_string()));
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::TemplatesChanged(names) if names == &["draft"])));

    controller.dispatch(Command::TextChanged("Final".to_string()));
    controller.dispatch(Command::TemplateLoaded("draft".to_string()));
    assert_eq!(controller.settings().watermark_text, "Draft");

    let notices = controller.dispatch(Command::TemplateDeleted("draft".to_string()));
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::TemplatesChanged(names) if names.is_empty())));

    let notices = controller.dispatch(Command::TemplateLoaded("draft".to_string()));
    assert_eq!(warnings(&notices).len(), 1);
}

#[test]
fn test_settings_persist_through_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watermark_settings.json");
    let mut controller = controller(dir.path());

    controller.dispatch(Command::PrefixChanged("img_".to_string()));
    controller.dispatch(Command::PositionChanged(Some(Point::new(12, 34))));
    controller.save_settings(&path).unwrap();

    let reloaded = Settings::load(&path);
    assert_eq!(reloaded.custom_prefix, "img_");
    assert_eq!(reloaded.position(), Some(Point::new(12, 34)));
}
