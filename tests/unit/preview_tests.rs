// Preview scheduler tests

use std::sync::Arc;

use shirushi::preview::{PreviewRequest, PreviewScheduler};
use shirushi::watermark::{FontFace, OutputFormat, Size, WatermarkSpec};

use super::common::{write_corrupt, write_rgb_png};

fn request(path: std::path::PathBuf, text: &str) -> PreviewRequest {
    PreviewRequest {
        path,
        spec: WatermarkSpec::new(text, 0, None),
        format: OutputFormat::Png,
        bounds: Size::new(64, 64),
    }
}

#[tokio::test]
async fn test_latest_request_wins() {
    let dir = tempfile::tempdir().unwrap();
    let large = write_rgb_png(dir.path(), "large.png", 1200, 900, [9, 9, 9]);
    let small = write_rgb_png(dir.path(), "small.png", 128, 64, [9, 9, 9]);
    let scheduler = PreviewScheduler::new(Arc::new(FontFace::Bitmap));

    let first = scheduler.request(request(large, "first"));
    let second = scheduler.request(request(small, "second"));
    assert_eq!(scheduler.current_generation(), 2);

    assert!(second.await.unwrap());
    first.await.unwrap();

    let published = scheduler.take_latest().unwrap();
    assert_eq!(published.generation, 2);
    let frame = published.result.unwrap();
    assert_eq!(frame.source_size, Size::new(128, 64));
    assert_eq!(frame.preview_size, Size::new(64, 32));

    assert!(scheduler.take_latest().is_none());
}

#[tokio::test]
async fn test_errors_are_published_too() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_corrupt(dir.path(), "bad.png");
    let scheduler = PreviewScheduler::new(Arc::new(FontFace::Bitmap));

    assert!(scheduler.request(request(bad, "x")).await.unwrap());

    let published = scheduler.take_latest().unwrap();
    assert_eq!(published.generation, 1);
    assert!(published.result.is_err());
}
