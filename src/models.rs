use image::GrayImage;
use imageproc::point::Point;

use crate::detection::geometry;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Smallest rectangle containing every point, counting pixels inclusively
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point<i32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        if max_x < min_x || max_y < min_y {
            return None;
        }

        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Crop this rectangle out of `img`, clamped to its bounds
    pub fn crop(&self, img: &GrayImage) -> Option<GrayImage> {
        let x = self.x.min(img.width());
        let y = self.y.min(img.height());
        let width = self.width.min(img.width() - x);
        let height = self.height.min(img.height() - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(image::imageops::crop_imm(img, x, y, width, height).to_image())
    }
}

/// Minimum-area oriented rectangle.
///
/// `angle` is in degrees within `[-90, 0)` and `width` is the side lying
/// along `angle`, so an upright box reports `-90` with `width` measured
/// vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Corner points, in order around the rectangle
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (cx, cy) = self.center;
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        // width runs along (cos, sin), height along (-sin, cos)
        let corner = |a: f64, b: f64| (cx + a * hw * cos - b * hh * sin, cy + a * hw * sin + b * hh * cos);
        [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)]
    }

    pub fn left(&self) -> f64 {
        self.corners().iter().map(|c| c.0).fold(f64::INFINITY, f64::min)
    }
}

/// One outline returned by contour extraction, with its derived hull and
/// oriented bounding box
#[derive(Debug, Clone)]
pub struct RawContour {
    pub points: Vec<Point<i32>>,
    pub hull: Vec<Point<i32>>,
    pub rect: RotatedRect,
}

impl RawContour {
    pub fn from_points(points: Vec<Point<i32>>) -> Self {
        let hull = geometry::convex_hull(&points);
        let rect = geometry::min_area_rect(&hull);
        Self { points, hull, rect }
    }

    pub fn hull_area(&self) -> f64 {
        imageproc::geometry::contour_area(&self.hull)
    }
}

/// Text read from one card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardReading {
    pub title: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
}
