// Batch export tests

use shirushi::error::WatermarkError;
use shirushi::export::{export_batch, Placement};
use shirushi::watermark::{FontFace, NamingRule, OutputFormat, OutputSpec, WatermarkSpec};

use super::common::{write_corrupt, write_rgb_png, write_rgba_png};

#[test]
fn test_batch_continues_past_undecodable_image() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![
        write_rgb_png(dir.path(), "one.png", 120, 90, [200, 200, 200]),
        write_corrupt(dir.path(), "two.png"),
        write_rgba_png(dir.path(), "three.png", 80, 80, [0, 0, 0, 255]),
    ];
    let output = OutputSpec {
        format: OutputFormat::Jpeg,
        naming_rule: NamingRule::Prefix("wm_".to_string()),
        destination_folder: dir.path().join("out"),
    };

    let mut seen = Vec::new();
    let report = export_batch(
        &images,
        &WatermarkSpec::default(),
        &output,
        Placement::default(),
        &FontFace::Bitmap,
        |progress| {
            assert_eq!(progress.total, 3);
            seen.push(progress.index);
        },
    )
    .unwrap();

    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(
        report.exported,
        vec![
            dir.path().join("out/wm_one.jpeg"),
            dir.path().join("out/wm_three.jpeg"),
        ]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, images[1]);
    assert!(matches!(
        report.failures[0].error,
        WatermarkError::Decode { .. }
    ));
    assert!(!dir.path().join("out/wm_two.jpeg").exists());

    for path in &report.exported {
        let written = image::open(path).unwrap();
        assert!(!written.color().has_alpha());
    }
}

#[test]
fn test_naming_rules_applied_to_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![write_rgb_png(dir.path(), "beach.png", 40, 40, [0, 0, 255])];

    for (rule, expected) in [
        (NamingRule::KeepOriginal, "beach.png"),
        (NamingRule::Prefix("p_".to_string()), "p_beach.png"),
        (NamingRule::Suffix("_s".to_string()), "beach_s.png"),
    ] {
        let output = OutputSpec {
            format: OutputFormat::Png,
            naming_rule: rule,
            destination_folder: dir.path().join("out"),
        };
        let report = export_batch(
            &images,
            &WatermarkSpec::default(),
            &output,
            Placement::default(),
            &FontFace::Bitmap,
            |_| {},
        )
        .unwrap();
        assert_eq!(report.exported, vec![dir.path().join("out").join(expected)]);
    }
}

#[test]
fn test_unwritable_destination_aborts_batch() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let output = OutputSpec {
        destination_folder: blocker.join("out"),
        ..Default::default()
    };
    let result = export_batch(
        &[],
        &WatermarkSpec::default(),
        &output,
        Placement::default(),
        &FontFace::Bitmap,
        |_| {},
    );
    assert!(result.is_err());
}
