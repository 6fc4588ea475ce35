//! Classification of traced outlines into glyphs and everything that is not
//! a glyph.
//!
//! Every size test is made in millimetres through the line's own
//! pixels-per-millimetre scale, so the same bands hold whatever the capture
//! resolution. The left margin is the one exception: it is a pixel column of
//! the working-height line.

use imageproc::point::Point;

use crate::config::{GlyphBands, RegionConfig};
use crate::detection::geometry::{self, ReferenceLine};
use crate::models::{RawContour, RotatedRect};

/// The geometry of the line a figure was traced from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub reference: ReferenceLine,
    pub px_per_mm: f64,
    pub left_margin_px: f64,
    pub text_height_mm: f64,
    pub glyphs: GlyphBands,
}

impl LineGeometry {
    /// Flat reference line through the middle of a `line_height_px` row
    pub fn for_region(region: &RegionConfig, line_height_px: u32, px_per_mm: f64) -> Self {
        Self {
            reference: ReferenceLine::flat(line_height_px as f64 / 2.0),
            px_per_mm,
            left_margin_px: region.left_margin_px,
            text_height_mm: region.text_height_mm,
            glyphs: region.glyphs,
        }
    }

    pub fn to_mm(&self, px: f64) -> f64 {
        px / self.px_per_mm
    }

    pub fn text_height_px(&self) -> f64 {
        self.text_height_mm * self.px_per_mm
    }
}

/// A traced outline bound to its line
#[derive(Debug, Clone)]
pub struct Figure {
    contour: RawContour,
    line: LineGeometry,
}

impl Figure {
    pub fn new(contour: RawContour, line: LineGeometry) -> Self {
        Self { contour, line }
    }

    pub fn hull(&self) -> &[Point<i32>] {
        &self.contour.hull
    }

    pub fn rect(&self) -> &RotatedRect {
        &self.contour.rect
    }

    /// Left-to-right ordering key; subtracting the short side tolerates
    /// slightly rotated boxes
    pub fn sort_key(&self) -> f64 {
        let rect = self.rect();
        rect.center.0 - rect.min_side()
    }

    pub fn is_outside_region(&self) -> bool {
        let left = self.rect().left();
        if left < self.line.left_margin_px {
            return true;
        }
        let expected_y = self.line.reference.y_at(left);
        (self.rect().center.1 - expected_y).abs() > self.line.text_height_px() / 2.0
    }

    pub fn is_accent_dot(&self) -> bool {
        let rect = self.rect();
        let bands = &self.line.glyphs;
        bands.accent_dot.contains(self.line.to_mm(rect.width))
            && bands.accent_dot.contains(self.line.to_mm(rect.height))
            && bands.accent_dot_angle.contains(rect.angle)
    }

    pub fn is_comma(&self) -> bool {
        let (x, _) = self.rect().center;
        if x < self.line.reference.y_at(x) {
            return false;
        }
        self.line.glyphs.comma.contains(self.line.to_mm(self.rect().max_side()))
    }

    pub fn is_dot_like(&self) -> bool {
        self.is_accent_dot() || self.is_comma()
    }

    pub fn is_dash(&self) -> bool {
        let rect = self.rect();
        let (x, y) = rect.center;
        let expected_y = self.line.reference.y_at(x);
        if (y - expected_y).abs() > self.line.text_height_px() / 5.0 {
            return false;
        }

        // width is the long side once the box is turned the right way up
        let (mut width, mut height) = (rect.width, rect.height);
        if rect.angle < -45.0 {
            std::mem::swap(&mut width, &mut height);
        }
        if width == 0.0 {
            return true;
        }

        let bands = &self.line.glyphs;
        let aspect = height / width;
        if aspect < bands.dash_aspect.min || aspect > bands.dash_aspect.max {
            return false;
        }
        bands.dash_thickness.contains(self.line.to_mm(height))
            && bands.dash_length.contains(self.line.to_mm(width))
    }

    pub fn is_letter_sized(&self) -> bool {
        let rect = self.rect();
        let bands = &self.line.glyphs;
        bands.letter_width.contains(self.line.to_mm(rect.min_side()))
            && bands.letter_height.contains(self.line.to_mm(rect.max_side()))
    }

    pub fn is_noise(&self) -> bool {
        self.is_dot_like() || self.is_dash() || !self.is_letter_sized() || self.is_outside_region()
    }

    /// Own center strictly inside `other`'s hull and own hull smaller
    pub fn is_contained_within(&self, other: &Figure) -> bool {
        let (x, y) = self.rect().center;
        if !geometry::point_strictly_inside(other.hull(), x, y) {
            return false;
        }
        self.contour.hull_area() < other.contour.hull_area()
    }

    /// Only the given candidates are checked, not every figure on the line
    pub fn is_letter_hole<'a>(&self, candidates: impl IntoIterator<Item = &'a Figure>) -> bool {
        candidates.into_iter().any(|c| self.is_contained_within(c))
    }
}

/// Same hull, traced twice
impl PartialEq for Figure {
    fn eq(&self, other: &Self) -> bool {
        self.hull() == other.hull()
    }
}
