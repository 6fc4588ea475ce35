use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::layout::SectionRect;

/// Working row height the pixel margins below were measured at
pub const CALIBRATED_LINE_HEIGHT_PX: u32 = 185;

/// Nominal cap height of the title font
pub const TITLE_TEXT_HEIGHT_MM: f64 = 2.5;

/// Nominal height of the footer text lines
pub const FOOTER_TEXT_HEIGHT_MM: f64 = 1.2;

/// Open interval in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value_mm: f64) -> bool {
        value_mm > self.min && value_mm < self.max
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// Size envelopes used to classify figures, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphBands {
    /// Both sides of an accent dot
    pub accent_dot: Band,
    /// Rotation of an accent dot's bounding box, degrees
    pub accent_dot_angle: Band,
    /// Larger side of a comma
    pub comma: Band,
    /// Short side of a dash
    pub dash_thickness: Band,
    /// Long side of a dash
    pub dash_length: Band,
    /// Thickness / length of a dash, inclusive
    pub dash_aspect: Band,
    /// Narrower side of a letter
    pub letter_width: Band,
    /// Taller side of a letter
    pub letter_height: Band,
}

impl Default for GlyphBands {
    fn default() -> Self {
        Self {
            accent_dot: Band::new(0.38, 0.76),
            accent_dot_angle: Band::new(-50.0, -40.0),
            comma: Band::new(0.76, 1.30),
            dash_thickness: Band::new(0.15, 0.61),
            dash_length: Band::new(0.76, 3.06),
            dash_aspect: Band::new(0.2, 0.35),
            letter_width: Band::new(0.30, 4.41),
            letter_height: Band::new(1.15, 4.41),
        }
    }
}

impl GlyphBands {
    /// Same proportions for text `factor` times the title's size
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            accent_dot: self.accent_dot.scaled(factor),
            accent_dot_angle: self.accent_dot_angle,
            comma: self.comma.scaled(factor),
            dash_thickness: self.dash_thickness.scaled(factor),
            dash_length: self.dash_length.scaled(factor),
            dash_aspect: self.dash_aspect,
            letter_width: self.letter_width.scaled(factor),
            letter_height: self.letter_height.scaled(factor),
        }
    }

    fn validate(&self) -> Result<()> {
        let bands = [
            ("accent_dot", self.accent_dot),
            ("accent_dot_angle", self.accent_dot_angle),
            ("comma", self.comma),
            ("dash_thickness", self.dash_thickness),
            ("dash_length", self.dash_length),
            ("dash_aspect", self.dash_aspect),
            ("letter_width", self.letter_width),
            ("letter_height", self.letter_height),
        ];
        for (name, band) in bands {
            if band.min >= band.max {
                bail!("glyph band {name} is empty ({} >= {})", band.min, band.max);
            }
        }
        Ok(())
    }
}

/// Everything needed to read one printed line of the card
#[derive(Debug, Clone, PartialEq)]
pub struct RegionConfig {
    pub rect: SectionRect,
    /// Samples at or above this become foreground
    pub threshold: u8,
    /// Complement luminance first (light text on a dark band)
    pub invert: bool,
    /// Figures starting left of this column belong to surrounding artwork.
    /// Only meaningful at `CALIBRATED_LINE_HEIGHT_PX`.
    pub left_margin_px: f64,
    pub text_height_mm: f64,
    pub glyphs: GlyphBands,
}

impl RegionConfig {
    pub fn title() -> Self {
        Self {
            rect: SectionRect::new(2.3, 4.0, 39.5, 6.0),
            threshold: 90,
            invert: false,
            left_margin_px: 45.0,
            text_height_mm: TITLE_TEXT_HEIGHT_MM,
            glyphs: GlyphBands::default(),
        }
    }

    /// First footer line: collector number and rarity
    pub fn collector_line() -> Self {
        Self {
            rect: SectionRect::new(3.0, 81.5, 15.0, 2.5),
            ..Self::footer()
        }
    }

    /// Second footer line: set code and language
    pub fn set_line() -> Self {
        Self {
            rect: SectionRect::new(3.0, 84.0, 15.0, 2.5),
            ..Self::footer()
        }
    }

    fn footer() -> Self {
        Self {
            rect: SectionRect::new(3.0, 81.5, 15.0, 2.5),
            threshold: 140,
            invert: true,
            left_margin_px: 20.0,
            text_height_mm: FOOTER_TEXT_HEIGHT_MM,
            glyphs: GlyphBands::default().scaled(FOOTER_TEXT_HEIGHT_MM / TITLE_TEXT_HEIGHT_MM),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let rect = &self.rect;
        if !(rect.width > 0.0 && rect.height > 0.0) {
            bail!("{name}: section rectangle must have a positive size");
        }
        if rect.x < 0.0 || rect.y < 0.0 {
            bail!("{name}: section rectangle must not start left of or above the card");
        }
        if !(self.text_height_mm > 0.0) {
            bail!("{name}: text_height_mm must be positive");
        }
        self.glyphs.validate().with_context(|| format!("{name}: invalid glyph bands"))
    }
}

/// Canny thresholds used before contour tracing
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low: f32,
    pub high: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self { low: 120.0, high: 240.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Minimum spacing between two requests
    pub min_interval_ms: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.scryfall.com".to_string(),
            min_interval_ms: 100,
            user_agent: concat!("mtgscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub card_height_mm: f64,
    pub working_line_height_px: u32,
    pub blur_sigma: f32,
    pub edges: EdgeConfig,
    pub title: RegionConfig,
    pub collector_line: RegionConfig,
    pub set_line: RegionConfig,
    pub catalog: CatalogConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            card_height_mm: 88.0,
            working_line_height_px: CALIBRATED_LINE_HEIGHT_PX,
            blur_sigma: 0.8,
            edges: EdgeConfig::default(),
            title: RegionConfig::title(),
            collector_line: RegionConfig::collector_line(),
            set_line: RegionConfig::set_line(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load overrides from a TOML file on top of the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Any subset of fields may be given; the rest keep their defaults.
    ///
    /// ```toml
    /// [title]
    /// threshold = 120
    ///
    /// [title.glyphs]
    /// letter_height = { min = 1.0, max = 4.5 }
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = file.apply(Self::default());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.card_height_mm > 0.0) {
            bail!("card_height_mm must be positive");
        }
        if self.working_line_height_px == 0 {
            bail!("working_line_height_px must be positive");
        }
        if self.blur_sigma < 0.0 {
            bail!("blur_sigma must not be negative");
        }
        self.title.validate("title")?;
        self.collector_line.validate("collector_line")?;
        self.set_line.validate("set_line")?;

        if self.working_line_height_px != CALIBRATED_LINE_HEIGHT_PX {
            tracing::warn!(
                working_line_height_px = self.working_line_height_px,
                calibrated = CALIBRATED_LINE_HEIGHT_PX,
                "left margins are pixel values measured at the calibrated line height; re-derive them"
            );
        }
        Ok(())
    }
}

// Override layer: every field optional so a partial table keeps the
// region's own defaults rather than the title's.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    card_height_mm: Option<f64>,
    working_line_height_px: Option<u32>,
    blur_sigma: Option<f32>,
    edges: Option<EdgeConfig>,
    title: Option<RegionOverrides>,
    collector_line: Option<RegionOverrides>,
    set_line: Option<RegionOverrides>,
    catalog: Option<CatalogConfig>,
}

impl ConfigFile {
    fn apply(self, mut config: ScanConfig) -> ScanConfig {
        if let Some(v) = self.card_height_mm {
            config.card_height_mm = v;
        }
        if let Some(v) = self.working_line_height_px {
            config.working_line_height_px = v;
        }
        if let Some(v) = self.blur_sigma {
            config.blur_sigma = v;
        }
        if let Some(v) = self.edges {
            config.edges = v;
        }
        if let Some(v) = self.title {
            v.apply(&mut config.title);
        }
        if let Some(v) = self.collector_line {
            v.apply(&mut config.collector_line);
        }
        if let Some(v) = self.set_line {
            v.apply(&mut config.set_line);
        }
        if let Some(v) = self.catalog {
            config.catalog = v;
        }
        config
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionOverrides {
    rect: Option<SectionRect>,
    threshold: Option<u8>,
    invert: Option<bool>,
    left_margin_px: Option<f64>,
    text_height_mm: Option<f64>,
    glyphs: Option<GlyphOverrides>,
}

impl RegionOverrides {
    fn apply(self, region: &mut RegionConfig) {
        if let Some(v) = self.rect {
            region.rect = v;
        }
        if let Some(v) = self.threshold {
            region.threshold = v;
        }
        if let Some(v) = self.invert {
            region.invert = v;
        }
        if let Some(v) = self.left_margin_px {
            region.left_margin_px = v;
        }
        if let Some(v) = self.text_height_mm {
            region.text_height_mm = v;
        }
        if let Some(v) = self.glyphs {
            v.apply(&mut region.glyphs);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GlyphOverrides {
    accent_dot: Option<Band>,
    accent_dot_angle: Option<Band>,
    comma: Option<Band>,
    dash_thickness: Option<Band>,
    dash_length: Option<Band>,
    dash_aspect: Option<Band>,
    letter_width: Option<Band>,
    letter_height: Option<Band>,
}

impl GlyphOverrides {
    fn apply(self, glyphs: &mut GlyphBands) {
        let slots = [
            (self.accent_dot, &mut glyphs.accent_dot),
            (self.accent_dot_angle, &mut glyphs.accent_dot_angle),
            (self.comma, &mut glyphs.comma),
            (self.dash_thickness, &mut glyphs.dash_thickness),
            (self.dash_length, &mut glyphs.dash_length),
            (self.dash_aspect, &mut glyphs.dash_aspect),
            (self.letter_width, &mut glyphs.letter_width),
            (self.letter_height, &mut glyphs.letter_height),
        ];
        for (value, slot) in slots {
            if let Some(band) = value {
                *slot = band;
            }
        }
    }
}
