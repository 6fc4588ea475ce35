use std::path::Path;

use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;

/// Reads the single line of text in a tight crop
pub trait TextRecognizer {
    fn recognize_line(&self, crop: &GrayImage) -> Result<String>;
}

/// Recognizer backed by the `ocrs` engine
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load models from the standard `ocrs` cache location
    pub fn from_cache() -> Result<Self> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;

        let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
        let detection_model_path = cache_dir.join("text-detection.rten");
        let recognition_model_path = cache_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        Self::from_model_paths(&detection_model_path, &recognition_model_path)
    }

    pub fn from_model_paths(detection_model: &Path, recognition_model: &Path) -> Result<Self> {
        let detection_model = Model::load_file(detection_model)?;
        let recognition_model = Model::load_file(recognition_model)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize_line(&self, crop: &GrayImage) -> Result<String> {
        let img = DynamicImage::ImageLuma8(pad_for_ocr(crop, 10)).to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| anyhow::anyhow!("Failed to prepare OCR input: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        let text = self.engine.get_text(&ocr_input)?;

        Ok(normalize_whitespace(&text))
    }
}

/// Place the crop on a white canvas with a uniform border; recognizers lose
/// glyphs that touch the image edge
pub fn pad_for_ocr(crop: &GrayImage, border: u32) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(
        crop.width() + 2 * border,
        crop.height() + 2 * border,
        Luma([255u8]),
    );
    image::imageops::overlay(&mut canvas, crop, border.into(), border.into());
    canvas
}

/// Collapse runs of whitespace (including line breaks) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
