mod common;

use image::{DynamicImage, GrayImage};
use mtgscan::debug::Scoped;
use mtgscan::{DebugSink, DirectorySink};

use common::RecordingSink;

#[test]
fn test_directory_sink_writes_png_per_label() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = DirectorySink::new(dir.path().join("debug"))?;

    sink.record("title/01_crop", &DynamicImage::ImageLuma8(GrayImage::new(4, 3)));

    let saved = dir.path().join("debug/title/01_crop.png");
    assert!(saved.exists());
    assert_eq!(image::open(&saved)?.into_luma8().dimensions(), (4, 3));
    Ok(())
}

#[test]
fn test_labels_are_normalised() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sink = DirectorySink::new(dir.path().to_path_buf())?;

    sink.record("Set Line/05 Threshold", &DynamicImage::ImageLuma8(GrayImage::new(2, 2)));

    assert!(dir.path().join("set_line/05_threshold.png").exists());
    Ok(())
}

#[test]
fn test_refuses_non_empty_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("leftover.png"), b"")?;

    let err = DirectorySink::new(dir.path().to_path_buf()).unwrap_err();
    assert!(err.to_string().contains("not empty"));
    Ok(())
}

#[test]
fn test_scoped_sink_prefixes_labels() {
    let inner = RecordingSink::default();
    let scoped = Scoped::new(&inner, "title");
    let nested = Scoped::new(&scoped, "card");

    scoped.record("01_crop", &DynamicImage::ImageLuma8(GrayImage::new(1, 1)));
    nested.record("02_grayscale", &DynamicImage::ImageLuma8(GrayImage::new(1, 1)));

    assert_eq!(*inner.labels.borrow(), vec!["title/01_crop", "title/card/02_grayscale"]);
}
