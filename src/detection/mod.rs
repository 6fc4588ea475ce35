pub mod contours;
pub mod figure;
pub mod geometry;
pub mod ocr;
pub mod preprocessing;
pub mod segmentation;

use anyhow::Result;
use image::DynamicImage;

use crate::config::{RegionConfig, ScanConfig};
use crate::debug::{DebugSink, Scoped};
use crate::detection::contours::{ContourExtractor, ImageprocContourExtractor};
use crate::detection::ocr::TextRecognizer;
use crate::detection::segmentation::Segmentation;
use crate::layout::CardGeometry;
use crate::models::CardReading;

/// Named printed lines of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Title,
    CollectorLine,
    SetLine,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Title => "title",
            Region::CollectorLine => "collector_line",
            Region::SetLine => "set_line",
        }
    }
}

/// Reads the identifying lines of one card image at a time
pub struct CardScanner {
    config: ScanConfig,
    extractor: Box<dyn ContourExtractor>,
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl CardScanner {
    pub fn new(config: ScanConfig) -> Self {
        let extractor = Box::new(ImageprocContourExtractor::new(&config.edges));
        Self { config, extractor, recognizer: None }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ContourExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn region_config(&self, region: Region) -> &RegionConfig {
        match region {
            Region::Title => &self.config.title,
            Region::CollectorLine => &self.config.collector_line,
            Region::SetLine => &self.config.set_line,
        }
    }

    /// Extract and segment one region. `Ok(None)` when no glyphs were found.
    pub fn segment_region(
        &self,
        card: &DynamicImage,
        region: Region,
        sink: &dyn DebugSink,
    ) -> Result<Option<Segmentation>> {
        let sink = Scoped::new(sink, region.name());
        let geometry = CardGeometry::of_image(self.config.card_height_mm, card)?;
        let region_config = self.region_config(region);

        let line = preprocessing::extract_line(
            card,
            &geometry,
            region_config,
            self.config.working_line_height_px,
            self.config.blur_sigma,
            &sink,
        )?;
        let segmentation = segmentation::segment(&line, region_config, self.extractor.as_ref(), &sink)?;

        if segmentation.is_none() {
            tracing::debug!(region = region.name(), "no glyphs found");
        }
        Ok(segmentation)
    }

    /// Text of one region; empty when nothing was segmented, no recognizer is
    /// configured, or recognition failed
    pub fn read_region(&self, card: &DynamicImage, region: Region, sink: &dyn DebugSink) -> Result<String> {
        let Some(segmentation) = self.segment_region(card, region, sink)? else {
            return Ok(String::new());
        };
        let Some(recognizer) = &self.recognizer else {
            return Ok(String::new());
        };

        match recognizer.recognize_line(&segmentation.crop) {
            Ok(text) => {
                tracing::debug!(region = region.name(), "recognized {text:?}");
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(region = region.name(), "text recognition failed: {e:#}");
                Ok(String::new())
            }
        }
    }

    pub fn read_title(&self, card: &DynamicImage, sink: &dyn DebugSink) -> Result<String> {
        self.read_region(card, Region::Title, sink)
    }

    pub fn read_set_code(&self, card: &DynamicImage, sink: &dyn DebugSink) -> Result<Option<String>> {
        let text = self.read_region(card, Region::SetLine, sink)?;
        Ok(parse_set_code(&text))
    }

    pub fn read_collector_number(&self, card: &DynamicImage, sink: &dyn DebugSink) -> Result<Option<String>> {
        let text = self.read_region(card, Region::CollectorLine, sink)?;
        Ok(parse_collector_number(&text))
    }

    pub fn scan(&self, card: &DynamicImage, sink: &dyn DebugSink) -> Result<CardReading> {
        Ok(CardReading {
            title: self.read_title(card, sink)?,
            set_code: self.read_set_code(card, sink)?,
            collector_number: self.read_collector_number(card, sink)?,
        })
    }
}

/// Leading digits of the first token, without leading zeros
pub fn parse_collector_number(text: &str) -> Option<String> {
    let token = text.split_whitespace().next()?;
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
}

/// First token reduced to lowercase ASCII alphanumerics
pub fn parse_set_code(text: &str) -> Option<String> {
    let token = text.split_whitespace().next()?;
    let code: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if code.is_empty() { None } else { Some(code) }
}
