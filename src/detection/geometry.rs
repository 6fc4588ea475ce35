use imageproc::point::Point;
use rten_imageproc::PointF;

use crate::models::RotatedRect;

/// Line through a point with a given slope, giving the expected vertical
/// position of a text row at any horizontal offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    x: f64,
    y: f64,
    slope: f64,
}

impl ReferenceLine {
    pub fn new(x: f64, y: f64, slope: f64) -> Self {
        Self { x, y, slope }
    }

    /// Horizontal line at height `y`
    pub fn flat(y: f64) -> Self {
        Self::new(0.0, y, 0.0)
    }

    pub fn y_at(&self, x: f64) -> f64 {
        self.y + self.slope * (x - self.x)
    }
}

/// Convex hull of a point set. Inputs too small to form a polygon are
/// returned deduplicated rather than rejected.
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut distinct = points.to_vec();
    distinct.sort_by_key(|p| (p.x, p.y));
    distinct.dedup();
    if distinct.len() < 3 {
        return distinct;
    }
    imageproc::geometry::convex_hull(distinct.as_slice())
}

/// True only when `(x, y)` lies strictly inside `polygon`; points on an edge
/// are outside.
pub fn point_strictly_inside(polygon: &[Point<i32>], x: f64, y: f64) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);

        let cross = (bx - ax) * (y - ay) - (by - ay) * (x - ax);
        let within_x = x >= ax.min(bx) && x <= ax.max(bx);
        let within_y = y >= ay.min(by) && y <= ay.max(by);
        if cross.abs() < 1e-9 && within_x && within_y {
            return false;
        }

        if (ay > y) != (by > y) {
            let crossing_x = ax + (y - ay) * (bx - ax) / (by - ay);
            if x < crossing_x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Minimum-area enclosing rectangle, reported with `angle` in `[-90, 0)`
/// and `width` the side lying along `angle`
pub fn min_area_rect(points: &[Point<i32>]) -> RotatedRect {
    let points: Vec<PointF> = points
        .iter()
        .map(|p| PointF::from_yx(p.y as f32, p.x as f32))
        .collect();
    let Some(rect) = rten_imageproc::min_area_rect(&points) else {
        return RotatedRect { center: (0.0, 0.0), width: 0.0, height: 0.0, angle: -90.0 };
    };

    let center = rect.center();
    let center = (center.x as f64, center.y as f64);
    let (along, across) = (rect.width() as f64, rect.height() as f64);

    // `along` runs perpendicular to the up axis
    let up = rect.up_axis();
    let direction = (up.x as f64).atan2(-(up.y as f64)).to_degrees().rem_euclid(180.0);
    let direction = if direction >= 180.0 { 0.0 } else { direction };
    if direction >= 90.0 {
        RotatedRect { center, width: along, height: across, angle: direction - 180.0 }
    } else {
        RotatedRect { center, width: across, height: along, angle: direction - 90.0 }
    }
}
