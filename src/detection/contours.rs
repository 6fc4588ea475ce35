use anyhow::Result;
use image::GrayImage;
use imageproc::contours::find_contours;

use crate::config::EdgeConfig;
use crate::detection::preprocessing;
use crate::models::RawContour;

/// Traces closed outlines in a binary line image
pub trait ContourExtractor {
    fn extract(&self, binary: &GrayImage) -> Result<Vec<RawContour>>;
}

/// Canny edges followed by border following, so strokes are outlined
/// whichever side of the threshold they fall on
#[derive(Debug, Clone, Copy)]
pub struct ImageprocContourExtractor {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl ImageprocContourExtractor {
    pub fn new(edges: &EdgeConfig) -> Self {
        Self { low_threshold: edges.low, high_threshold: edges.high }
    }
}

impl Default for ImageprocContourExtractor {
    fn default() -> Self {
        Self::new(&EdgeConfig::default())
    }
}

impl ContourExtractor for ImageprocContourExtractor {
    fn extract(&self, binary: &GrayImage) -> Result<Vec<RawContour>> {
        let edges = preprocessing::detect_edges(binary, self.low_threshold, self.high_threshold);
        let contours = find_contours::<i32>(&edges)
            .into_iter()
            .filter(|c| !c.points.is_empty())
            .map(|c| RawContour::from_points(c.points))
            .collect();
        Ok(contours)
    }
}
