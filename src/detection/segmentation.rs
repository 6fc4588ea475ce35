use anyhow::Result;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::config::RegionConfig;
use crate::debug::DebugSink;
use crate::detection::contours::ContourExtractor;
use crate::detection::figure::{Figure, LineGeometry};
use crate::detection::preprocessing::ExtractedLine;
use crate::models::{BoundingBox, RawContour};

/// Glyphs found on one line
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Encloses every figure that survived noise filtering
    pub bounds: BoundingBox,
    /// Surviving figures with letter holes removed, left to right
    pub glyphs: Vec<Figure>,
    /// `bounds` cut out of the working bitmap
    pub crop: GrayImage,
}

/// Trace a line's outlines and segment them. `Ok(None)` means nothing on the
/// line looked like text.
pub fn segment(
    line: &ExtractedLine,
    region: &RegionConfig,
    extractor: &dyn ContourExtractor,
    sink: &dyn DebugSink,
) -> Result<Option<Segmentation>> {
    let contours = extractor.extract(&line.image)?;
    Ok(segment_contours(line, region, contours, sink))
}

pub fn segment_contours(
    line: &ExtractedLine,
    region: &RegionConfig,
    contours: Vec<RawContour>,
    sink: &dyn DebugSink,
) -> Option<Segmentation> {
    let geometry = LineGeometry::for_region(region, line.image.height(), line.px_per_mm());
    let mut figures: Vec<Figure> = contours.into_iter().map(|c| Figure::new(c, geometry)).collect();
    tracing::debug!("# of figures: {}", figures.len());

    sort_figures(&mut figures);
    let figures = remove_adjacent_duplicates(figures);
    tracing::debug!("# of figures after removing duplicates: {}", figures.len());

    let figures = remove_noise(figures);
    tracing::debug!("# of figures after noise filter: {}", figures.len());

    let bounds = bounding_rect(&figures)?;
    let glyphs = remove_letter_holes(figures);
    tracing::debug!("# of figures after hole filter: {}", glyphs.len());

    sink.record("06_figures", &DynamicImage::ImageRgb8(draw_figures(&line.image, &glyphs, &bounds)));

    let crop = bounds.crop(&line.image)?;
    sink.record("07_tight_crop", &DynamicImage::ImageLuma8(crop.clone()));

    Some(Segmentation { bounds, glyphs, crop })
}

/// Stable left-to-right sort
pub fn sort_figures(figures: &mut [Figure]) {
    figures.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
}

/// Drop figures equal to their predecessor. Only neighbours are compared, so
/// the input is expected to be sorted.
pub fn remove_adjacent_duplicates(figures: Vec<Figure>) -> Vec<Figure> {
    let mut out: Vec<Figure> = Vec::with_capacity(figures.len());
    for figure in figures {
        if out.last() != Some(&figure) {
            out.push(figure);
        }
    }
    out
}

pub fn remove_noise(figures: Vec<Figure>) -> Vec<Figure> {
    figures.into_iter().filter(|f| !f.is_noise()).collect()
}

/// Straight rectangle around every hull point, `None` for no figures
pub fn bounding_rect(figures: &[Figure]) -> Option<BoundingBox> {
    BoundingBox::enclosing(figures.iter().flat_map(|f| f.hull().iter()))
}

/// One pass; each figure is only tested against the last figure kept and
/// the next one in order. A hole whose letter is not an immediate neighbour
/// survives.
pub fn remove_letter_holes(figures: Vec<Figure>) -> Vec<Figure> {
    let mut kept: Vec<Figure> = Vec::with_capacity(figures.len());
    for (i, figure) in figures.iter().enumerate() {
        let neighbours = kept.last().into_iter().chain(figures.get(i + 1));
        if !figure.is_letter_hole(neighbours) {
            kept.push(figure.clone());
        }
    }
    kept
}

fn draw_figures(binary: &GrayImage, figures: &[Figure], bounds: &BoundingBox) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(binary.clone()).to_rgb8();
    let hull_color = Rgb([255u8, 0, 255]);
    for figure in figures {
        let hull = figure.hull();
        for (i, a) in hull.iter().enumerate() {
            let b = hull[(i + 1) % hull.len()];
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                hull_color,
            );
        }
    }
    if !bounds.is_empty() {
        let rect = Rect::at(bounds.x as i32, bounds.y as i32).of_size(bounds.width, bounds.height);
        draw_hollow_rect_mut(&mut canvas, rect, Rgb([0u8, 255, 0]));
    }
    canvas
}
