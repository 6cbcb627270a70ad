//! Scatter marker shapes.
//!
//! Each step of a greedy path gets its own shape so that the legend-style
//! labels can refer back to the points with a glyph.

use crate::geometry::Point;
use crate::render::circle_polygon;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Pixels per point at the given resolution.
#[must_use]
pub fn points_to_px(points: f32, dpi: f32) -> f32 {
    points * dpi / 72.0
}

/// Marker diameter in pixels for an area `s` given in pt².
#[must_use]
pub fn marker_diameter(s: f32, dpi: f32) -> f32 {
    points_to_px(s.max(0.0).sqrt(), dpi)
}

/// Marker shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerShape {
    /// Thin `+` drawn with strokes (the factual point).
    Plus,
    /// Filled circle.
    #[default]
    Circle,
    /// Upward triangle.
    TriangleUp,
    /// Square.
    Square,
    /// Regular pentagon.
    Pentagon,
    /// Thick filled plus.
    FilledPlus,
    /// Five-pointed star.
    Star,
    /// Thick filled x.
    Cross,
    /// Diamond.
    Diamond,
}

/// Shapes handed out to successive feature changes.
const STEP_SHAPES: [MarkerShape; 8] = [
    MarkerShape::Circle,
    MarkerShape::TriangleUp,
    MarkerShape::Square,
    MarkerShape::Pentagon,
    MarkerShape::FilledPlus,
    MarkerShape::Star,
    MarkerShape::Cross,
    MarkerShape::Diamond,
];

impl MarkerShape {
    /// Shape of the `step`-th change (0-based), cycling after eight.
    #[must_use]
    pub fn for_step(step: usize) -> Self {
        STEP_SHAPES[step % STEP_SHAPES.len()]
    }

    /// Text glyph that looks like the marker.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Plus => '+',
            Self::Circle => '●',
            Self::TriangleUp => '▲',
            Self::Square => '■',
            Self::Pentagon => '⬟',
            Self::FilledPlus => '✚',
            Self::Star => '★',
            Self::Cross => '✖',
            Self::Diamond => '◆',
        }
    }

    /// Whether the shape is drawn as strokes rather than a filled outline.
    #[must_use]
    pub fn is_stroked(self) -> bool {
        matches!(self, Self::Plus)
    }

    /// Outline polygon centred on `center` fitting a `size` pixel box.
    ///
    /// For stroked shapes this is empty; use [`MarkerShape::strokes`].
    #[must_use]
    pub fn outline(self, center: Point, size: f32) -> Vec<Point> {
        let r = size / 2.0;
        match self {
            Self::Plus => Vec::new(),
            Self::Circle => circle_polygon(center, r, 24),
            Self::TriangleUp => regular(center, r, 3, -FRAC_PI_2),
            Self::Square => regular(center, r * std::f32::consts::SQRT_2 * 0.8, 4, TAU / 8.0),
            Self::Pentagon => regular(center, r, 5, -FRAC_PI_2),
            Self::Diamond => regular(center, r, 4, -FRAC_PI_2),
            Self::Star => star(center, r, r * 0.4),
            Self::FilledPlus => thick_plus(center, r, 0.0),
            Self::Cross => thick_plus(center, r, TAU / 8.0),
        }
    }

    /// Stroke segments for stroked shapes (empty otherwise).
    #[must_use]
    pub fn strokes(self, center: Point, size: f32) -> Vec<(Point, Point)> {
        let r = size / 2.0;
        match self {
            Self::Plus => vec![
                (center.offset(-r, 0.0), center.offset(r, 0.0)),
                (center.offset(0.0, -r), center.offset(0.0, r)),
            ],
            _ => Vec::new(),
        }
    }
}

fn regular(center: Point, r: f32, sides: usize, start: f32) -> Vec<Point> {
    (0..sides)
        .map(|i| {
            let a = start + TAU * i as f32 / sides as f32;
            Point::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}

fn star(center: Point, outer: f32, inner: f32) -> Vec<Point> {
    (0..10)
        .map(|i| {
            let a = -FRAC_PI_2 + TAU * i as f32 / 10.0;
            let r = if i % 2 == 0 { outer } else { inner };
            Point::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}

/// Twelve-corner plus with arm half-width `r / 3`, rotated by `angle`.
fn thick_plus(center: Point, r: f32, angle: f32) -> Vec<Point> {
    let w = r / 3.0;
    let corners = [
        (w, r),
        (w, w),
        (r, w),
        (r, -w),
        (w, -w),
        (w, -r),
        (-w, -r),
        (-w, -w),
        (-r, -w),
        (-r, w),
        (-w, w),
        (-w, r),
    ];
    let (sin, cos) = angle.sin_cos();
    corners
        .iter()
        .map(|&(x, y)| Point::new(center.x + x * cos - y * sin, center.y + x * sin + y * cos))
        .collect()
}
