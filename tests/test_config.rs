use std::io::Write;

use mtgscan::config::{Band, CALIBRATED_LINE_HEIGHT_PX, GlyphBands};
use mtgscan::layout::SectionRect;
use mtgscan::{RegionConfig, ScanConfig};
use tempfile::NamedTempFile;

#[test]
fn test_defaults() -> anyhow::Result<()> {
    let config = ScanConfig::default();
    config.validate()?;

    assert_eq!(config.card_height_mm, 88.0);
    assert_eq!(config.working_line_height_px, CALIBRATED_LINE_HEIGHT_PX);
    assert_eq!(config.title.threshold, 90);
    assert!(!config.title.invert);
    assert!(config.collector_line.invert);
    assert_eq!(config.set_line.threshold, 140);
    assert_eq!(config.catalog.base_url, "https://api.scryfall.com");
    Ok(())
}

#[test]
fn test_footer_bands_follow_text_height() {
    let title = RegionConfig::title().glyphs;
    let footer = RegionConfig::set_line().glyphs;

    assert!((footer.letter_height.max - title.letter_height.max * 0.48).abs() < 1e-9);
    assert!((footer.comma.min - title.comma.min * 0.48).abs() < 1e-9);
    assert_eq!(footer.accent_dot_angle, title.accent_dot_angle);
    assert_eq!(footer.dash_aspect, title.dash_aspect);
}

#[test]
fn test_band_is_open() {
    let band = Band::new(1.0, 2.0);
    assert!(band.contains(1.5));
    assert!(!band.contains(1.0));
    assert!(!band.contains(2.0));
}

#[test]
fn test_empty_file_is_the_default() -> anyhow::Result<()> {
    assert_eq!(ScanConfig::from_toml("")?, ScanConfig::default());
    Ok(())
}

#[test]
fn test_partial_region_keeps_its_own_defaults() -> anyhow::Result<()> {
    let config = ScanConfig::from_toml(
        r#"
        [set_line]
        threshold = 120

        [set_line.glyphs]
        letter_height = { min = 0.5, max = 2.5 }
        "#,
    )?;

    let defaults = RegionConfig::set_line();
    assert_eq!(config.set_line.threshold, 120);
    assert!(config.set_line.invert);
    assert_eq!(config.set_line.rect, defaults.rect);
    assert_eq!(config.set_line.left_margin_px, defaults.left_margin_px);
    assert_eq!(config.set_line.glyphs.letter_height, Band::new(0.5, 2.5));
    assert_eq!(config.set_line.glyphs.letter_width, defaults.glyphs.letter_width);
    assert_eq!(config.title, RegionConfig::title());
    Ok(())
}

#[test]
fn test_section_and_edge_overrides() -> anyhow::Result<()> {
    let config = ScanConfig::from_toml(
        r#"
        card_height_mm = 88.9
        blur_sigma = 0.0

        [edges]
        low = 50.0

        [title]
        rect = { x = 2.0, y = 3.5, width = 40.0, height = 6.5 }
        "#,
    )?;

    assert_eq!(config.card_height_mm, 88.9);
    assert_eq!(config.blur_sigma, 0.0);
    assert_eq!(config.edges.low, 50.0);
    assert_eq!(config.edges.high, 240.0);
    assert_eq!(config.title.rect, SectionRect::new(2.0, 3.5, 40.0, 6.5));
    Ok(())
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(ScanConfig::from_toml("card_height_mm = 0.0").is_err());
    assert!(ScanConfig::from_toml("working_line_height_px = 0").is_err());
    assert!(ScanConfig::from_toml("blur_sigma = -1.0").is_err());
    assert!(ScanConfig::from_toml("[title.glyphs]\ncomma = { min = 2.0, max = 1.0 }").is_err());
    assert!(ScanConfig::from_toml("[title]\nrect = { x = 0.0, y = 0.0, width = 0.0, height = 6.0 }").is_err());
}

#[test]
fn test_unknown_keys_are_rejected() {
    assert!(ScanConfig::from_toml("thresold = 3").is_err());
    assert!(ScanConfig::from_toml("[title]\nthresold = 3").is_err());
}

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[collector_line]\nleft_margin_px = 30.0")?;

    let config = ScanConfig::load(file.path())?;
    assert_eq!(config.collector_line.left_margin_px, 30.0);
    assert_eq!(config.set_line.left_margin_px, 20.0);
    Ok(())
}

#[test]
fn test_load_reports_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.toml");

    let err = ScanConfig::load(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("missing.toml"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "card_height_mm = \"tall\"")?;
    let err = ScanConfig::load(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"));
    Ok(())
}

#[test]
fn test_glyph_bands_default_is_title_sized() {
    assert_eq!(RegionConfig::title().glyphs, GlyphBands::default());
}
