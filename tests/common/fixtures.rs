use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::point::Point;
use mtgscan::detection::contours::ContourExtractor;
use mtgscan::detection::figure::{Figure, LineGeometry};
use mtgscan::detection::ocr::TextRecognizer;
use mtgscan::detection::preprocessing::ExtractedLine;
use mtgscan::{CardCatalog, CardRecord, DebugSink, RawContour, RegionConfig};

/// Working row height every line is normalised to
pub const LINE_HEIGHT: u32 = 185;

/// Pixels per millimetre of a title line at the working height
pub fn title_px_per_mm() -> f64 {
    LINE_HEIGHT as f64 / RegionConfig::title().rect.height
}

pub fn title_geometry() -> LineGeometry {
    LineGeometry::for_region(&RegionConfig::title(), LINE_HEIGHT, title_px_per_mm())
}

/// Same line captured at `factor` times the resolution
pub fn scaled_title_geometry(factor: f64) -> LineGeometry {
    let region = RegionConfig::title();
    let mut geometry =
        LineGeometry::for_region(&region, (LINE_HEIGHT as f64 * factor) as u32, title_px_per_mm() * factor);
    geometry.left_margin_px = region.left_margin_px * factor;
    geometry
}

/// Axis-aligned rectangle outline from `(x0, y0)` to `(x1, y1)`
pub fn rect_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> RawContour {
    RawContour::from_points(vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ])
}

/// Square turned 45 degrees, corners `r` pixels from the center
pub fn diamond_contour(cx: i32, cy: i32, r: i32) -> RawContour {
    RawContour::from_points(vec![
        Point::new(cx, cy - r),
        Point::new(cx + r, cy),
        Point::new(cx, cy + r),
        Point::new(cx - r, cy),
    ])
}

pub fn scale_contour(contour: &RawContour, factor: i32) -> RawContour {
    RawContour::from_points(
        contour.points.iter().map(|p| Point::new(p.x * factor, p.y * factor)).collect(),
    )
}

pub fn title_figure(contour: RawContour) -> Figure {
    Figure::new(contour, title_geometry())
}

// Shapes on a title line, in working pixels (30.8 px/mm, midline at 92.5)

/// Lowercase stem, 12 x 61 px
pub fn letter_stem() -> RawContour {
    rect_contour(100, 70, 112, 131)
}

/// Accent dot floating above `letter_stem`
pub fn accent_dot() -> RawContour {
    diamond_contour(106, 56, 12)
}

/// Hyphen across the midline, 50 x 11 px
pub fn hyphen() -> RawContour {
    rect_contour(100, 88, 150, 99)
}

/// Comma-sized mark sitting low on the line
pub fn comma() -> RawContour {
    rect_contour(300, 100, 312, 132)
}

/// Outer outline of an "o"
pub fn ring_outer() -> RawContour {
    rect_contour(100, 60, 150, 125)
}

/// Counter of `ring_outer`
pub fn ring_hole() -> RawContour {
    rect_contour(112, 70, 138, 115)
}

/// White working line with the title section's geometry
pub fn blank_title_line(width: u32) -> ExtractedLine {
    ExtractedLine {
        image: GrayImage::from_pixel(width, LINE_HEIGHT, Luma([255u8])),
        section: RegionConfig::title().rect,
    }
}

/// Hands out the same outlines for every line
pub struct FixedContours(pub Vec<RawContour>);

impl ContourExtractor for FixedContours {
    fn extract(&self, _binary: &GrayImage) -> Result<Vec<RawContour>> {
        Ok(self.0.clone())
    }
}

/// Returns queued answers in order, then empty strings
#[derive(Default)]
pub struct ScriptedRecognizer {
    answers: RefCell<VecDeque<String>>,
}

impl ScriptedRecognizer {
    pub fn new(answers: &[&str]) -> Self {
        Self { answers: RefCell::new(answers.iter().map(|s| s.to_string()).collect()) }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize_line(&self, _crop: &GrayImage) -> Result<String> {
        Ok(self.answers.borrow_mut().pop_front().unwrap_or_default())
    }
}

pub struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize_line(&self, _crop: &GrayImage) -> Result<String> {
        anyhow::bail!("engine unavailable")
    }
}

/// Collects the labels it is offered
#[derive(Default)]
pub struct RecordingSink {
    pub labels: RefCell<Vec<String>>,
}

impl DebugSink for RecordingSink {
    fn record(&self, label: &str, _image: &DynamicImage) {
        self.labels.borrow_mut().push(label.to_string());
    }
}

pub fn card(name: &str, set: &str, collector_number: &str) -> CardRecord {
    CardRecord {
        name: name.to_string(),
        set: set.to_string(),
        collector_number: collector_number.to_string(),
        prints_search_uri: Some(format!("prints:{name}")),
    }
}

/// In-memory catalog; any lookup can be made to fail
#[derive(Default)]
pub struct FakeCatalog {
    pub by_number: HashMap<(String, String), CardRecord>,
    pub by_name: HashMap<String, CardRecord>,
    pub printings: HashMap<String, Vec<CardRecord>>,
    pub fail_by_number: bool,
    pub fail_fuzzy: bool,
    pub fail_printings: bool,
    pub number_lookups: Cell<usize>,
    pub fuzzy_lookups: Cell<usize>,
}

impl FakeCatalog {
    pub fn with_card_at(mut self, record: CardRecord) -> Self {
        self.by_number
            .insert((record.set.clone(), record.collector_number.clone()), record);
        self
    }

    /// `query` fuzzily resolves to `record`, printed as `printings`
    pub fn with_fuzzy(mut self, query: &str, record: CardRecord, printings: Vec<CardRecord>) -> Self {
        self.printings.insert(record.name.clone(), printings);
        self.by_name.insert(query.to_string(), record);
        self
    }
}

impl CardCatalog for FakeCatalog {
    fn card_by_number(&self, set_code: &str, collector_number: &str) -> Result<Option<CardRecord>> {
        self.number_lookups.set(self.number_lookups.get() + 1);
        if self.fail_by_number {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(self
            .by_number
            .get(&(set_code.to_string(), collector_number.to_string()))
            .cloned())
    }

    fn card_by_fuzzy_name(&self, title: &str) -> Result<Option<CardRecord>> {
        self.fuzzy_lookups.set(self.fuzzy_lookups.get() + 1);
        if self.fail_fuzzy {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(self.by_name.get(title).cloned())
    }

    fn printings(&self, card: &CardRecord) -> Result<Vec<CardRecord>> {
        if self.fail_printings {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(self.printings.get(&card.name).cloned().unwrap_or_default())
    }
}
