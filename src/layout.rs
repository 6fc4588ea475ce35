use anyhow::{Result, bail};
use image::GenericImageView;
use serde::Deserialize;

use crate::models::BoundingBox;

/// Rectangle in millimetres from the card's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SectionRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Nominal card size and the pixel size of the image it was captured in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardGeometry {
    card_height_mm: f64,
    width_px: u32,
    height_px: u32,
}

impl CardGeometry {
    pub fn new(card_height_mm: f64, width_px: u32, height_px: u32) -> Result<Self> {
        if height_px == 0 {
            bail!("card image has zero height");
        }
        if !(card_height_mm > 0.0) {
            bail!("nominal card height must be positive, got {card_height_mm}");
        }
        Ok(Self { card_height_mm, width_px, height_px })
    }

    pub fn of_image(card_height_mm: f64, img: &impl GenericImageView) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(card_height_mm, width, height)
    }

    pub fn px_per_mm(&self) -> f64 {
        self.height_px as f64 / self.card_height_mm
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn height_px(&self) -> u32 {
        self.height_px
    }
}

/// Scale a millimetre rectangle into whole image pixels, truncating each value
pub fn pixel_rect(rect: &SectionRect, geometry: &CardGeometry) -> BoundingBox {
    let factor = geometry.px_per_mm();
    let truncate = |mm: f64| (mm * factor).max(0.0) as u32;
    BoundingBox::new(truncate(rect.x), truncate(rect.y), truncate(rect.width), truncate(rect.height))
}
