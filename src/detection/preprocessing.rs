use anyhow::{Result, bail};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use crate::config::RegionConfig;
use crate::debug::DebugSink;
use crate::layout::{self, CardGeometry, SectionRect};

/// One printed line cropped out of the card and normalised to the working
/// row height, binarised
#[derive(Debug, Clone)]
pub struct ExtractedLine {
    pub image: GrayImage,
    pub section: SectionRect,
}

impl ExtractedLine {
    /// Scale of this bitmap, independent of the source photo's resolution
    pub fn px_per_mm(&self) -> f64 {
        self.image.height() as f64 / self.section.height
    }
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Resize to exactly `height` rows, keeping the aspect ratio
pub fn resize_to_height(img: &GrayImage, height: u32) -> GrayImage {
    let width = ((img.width() as u64 * height as u64) / img.height().max(1) as u64).max(1) as u32;
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    gaussian_blur_f32(img, sigma)
}

/// Samples at or above `threshold` become white, the rest black
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] >= threshold { Luma([255]) } else { Luma([0]) }
    })
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Crop a region of the card and normalise it into a binary working line
pub fn extract_line(
    card: &DynamicImage,
    geometry: &CardGeometry,
    region: &RegionConfig,
    working_height: u32,
    blur_sigma: f32,
    sink: &dyn DebugSink,
) -> Result<ExtractedLine> {
    let rect = layout::pixel_rect(&region.rect, geometry);
    let cropped = card.crop_imm(rect.x, rect.y, rect.width, rect.height);
    if cropped.width() == 0 || cropped.height() == 0 {
        bail!(
            "section at {}x{}+{}+{} lies outside the {}x{} image",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            geometry.width_px(),
            geometry.height_px()
        );
    }
    sink.record("01_crop", &cropped);

    let mut gray = to_grayscale(&cropped);
    if region.invert {
        image::imageops::invert(&mut gray);
    }
    sink.record("02_grayscale", &DynamicImage::ImageLuma8(gray.clone()));

    let working = resize_to_height(&gray, working_height);
    sink.record("03_working_resolution", &DynamicImage::ImageLuma8(working.clone()));

    let blurred = apply_blur(&working, blur_sigma);
    sink.record("04_blurred", &DynamicImage::ImageLuma8(blurred.clone()));

    let binary = binarize(&blurred, region.threshold);
    sink.record("05_threshold", &DynamicImage::ImageLuma8(binary.clone()));

    tracing::debug!(
        crop_width = rect.width,
        crop_height = rect.height,
        line_width = binary.width(),
        "extracted line"
    );

    Ok(ExtractedLine { image: binary, section: region.rect })
}
