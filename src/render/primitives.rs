//! Primitive rendering functions.
//!
//! Implements rasterization algorithms for the shapes a figure is made of.

use crate::color::Rgba;
use crate::framebuffer::Framebuffer;
use crate::geometry::{Line, Point, Rect};

/// Trait for drawable primitives.
pub trait Drawable {
    /// Draw this primitive to a framebuffer.
    fn draw(&self, fb: &mut Framebuffer, color: Rgba);

    /// Draw this primitive with anti-aliasing if supported.
    fn draw_aa(&self, fb: &mut Framebuffer, color: Rgba) {
        // Default to non-AA drawing
        self.draw(fb, color);
    }
}

// ============================================================================
// Line Drawing
// ============================================================================

/// Draw a line using Bresenham's algorithm (non-antialiased).
pub fn draw_line(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        if x >= 0 && y >= 0 {
            fb.blend_pixel(x as u32, y as u32, color);
        }

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw an anti-aliased line using Wu's algorithm.
///
/// Two pixels are drawn at each step along the major axis, with intensities
/// set by the fractional distance from the ideal line.
pub fn draw_line_aa(fb: &mut Framebuffer, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
    let steep = (y1 - y0).abs() > (x1 - x0).abs();

    let (x0, y0, x1, y1) = if steep { (y0, x0, y1, x1) } else { (x0, y0, x1, y1) };
    let (x0, y0, x1, y1) = if x0 > x1 { (x1, y1, x0, y0) } else { (x0, y0, x1, y1) };

    let dx = x1 - x0;
    let dy = y1 - y0;
    let gradient = if dx.abs() < f32::EPSILON { 1.0 } else { dy / dx };

    // First endpoint
    let xend = x0.round();
    let yend = y0 + gradient * (xend - x0);
    let xgap = rfpart(x0 + 0.5);
    let xpxl1 = xend as i32;
    let ypxl1 = yend.floor() as i32;
    plot_pair(fb, steep, xpxl1, ypxl1, yend, xgap, color);

    let mut intery = yend + gradient;

    // Second endpoint
    let xend = x1.round();
    let yend = y1 + gradient * (xend - x1);
    let xgap = fpart(x1 + 0.5);
    let xpxl2 = xend as i32;
    let ypxl2 = yend.floor() as i32;
    plot_pair(fb, steep, xpxl2, ypxl2, yend, xgap, color);

    for x in (xpxl1 + 1)..xpxl2 {
        plot_pair(fb, steep, x, intery.floor() as i32, intery, 1.0, color);
        intery += gradient;
    }
}

/// Plot the two pixels straddling the ideal line at one major-axis step.
#[inline]
fn plot_pair(fb: &mut Framebuffer, steep: bool, major: i32, minor: i32, exact: f32, gap: f32, color: Rgba) {
    if steep {
        plot(fb, minor, major, color, rfpart(exact) * gap);
        plot(fb, minor + 1, major, color, fpart(exact) * gap);
    } else {
        plot(fb, major, minor, color, rfpart(exact) * gap);
        plot(fb, major, minor + 1, color, fpart(exact) * gap);
    }
}

/// Plot a pixel with intensity (for anti-aliased drawing).
#[inline]
fn plot(fb: &mut Framebuffer, x: i32, y: i32, color: Rgba, intensity: f32) {
    if x >= 0 && y >= 0 && x < fb.width() as i32 && y < fb.height() as i32 {
        let alpha = (f32::from(color.a) * intensity) as u8;
        fb.blend_pixel(x as u32, y as u32, color.with_alpha(alpha));
    }
}

/// Fractional part of a float.
#[inline]
fn fpart(x: f32) -> f32 {
    x - x.floor()
}

/// Reverse fractional part.
#[inline]
fn rfpart(x: f32) -> f32 {
    1.0 - fpart(x)
}

/// Draw a dashed anti-aliased line with an `on`/`off` pattern in pixels.
///
/// A non-positive `on` length draws a solid line.
pub fn draw_dashed_line(fb: &mut Framebuffer, line: Line, on: f32, off: f32, color: Rgba) {
    let length = line.length();
    if on <= 0.0 || length <= f32::EPSILON {
        line.draw_aa(fb, color);
        return;
    }

    let period = on + off.max(0.0);
    let mut t = 0.0;
    while t < length {
        let end = (t + on).min(length);
        let a = line.start.lerp(line.end, t / length);
        let b = line.start.lerp(line.end, end / length);
        draw_line_aa(fb, a.x, a.y, b.x, b.y, color);
        t += period;
    }
}

/// Clip a segment to a rectangle (Liang-Barsky).
///
/// Returns `None` when no part of the segment is inside.
#[must_use]
pub fn clip_line(line: Line, clip: &Rect) -> Option<Line> {
    let dx = line.end.x - line.start.x;
    let dy = line.end.y - line.start.y;
    let mut t0: f32 = 0.0;
    let mut t1: f32 = 1.0;

    let checks = [
        (-dx, line.start.x - clip.x),
        (dx, clip.right() - line.start.x),
        (-dy, line.start.y - clip.y),
        (dy, clip.bottom() - line.start.y),
    ];

    for (p, q) in checks {
        if p.abs() < f32::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some(Line::new(line.start.lerp(line.end, t0), line.start.lerp(line.end, t1)))
}

impl Drawable for Line {
    fn draw(&self, fb: &mut Framebuffer, color: Rgba) {
        draw_line(
            fb,
            self.start.x as i32,
            self.start.y as i32,
            self.end.x as i32,
            self.end.y as i32,
            color,
        );
    }

    fn draw_aa(&self, fb: &mut Framebuffer, color: Rgba) {
        draw_line_aa(fb, self.start.x, self.start.y, self.end.x, self.end.y, color);
    }
}

// ============================================================================
// Area Filling
// ============================================================================

/// Draw a filled rectangle.
pub fn draw_rect(fb: &mut Framebuffer, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
    // shift the size when the origin is left of / above the buffer
    let width = width.saturating_sub(x.min(0).unsigned_abs());
    let height = height.saturating_sub(y.min(0).unsigned_abs());
    fb.fill_rect(x.max(0) as u32, y.max(0) as u32, width, height, color);
}

impl Drawable for Rect {
    fn draw(&self, fb: &mut Framebuffer, color: Rgba) {
        draw_rect(
            fb,
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as u32,
            self.height.round() as u32,
            color,
        );
    }
}

/// Fill a polygon with the even-odd rule, sampling pixel centres.
///
/// Pixels outside `clip` are left untouched.
pub fn fill_polygon(fb: &mut Framebuffer, points: &[Point], color: Rgba, clip: Option<&Rect>) {
    let Some(bounds) = Rect::bounding(points) else {
        return;
    };
    if points.len() < 3 {
        return;
    }

    let canvas = Rect::new(0.0, 0.0, fb.width() as f32, fb.height() as f32);
    let area = match clip.and_then(|c| c.intersect(&canvas)) {
        Some(c) => c,
        None if clip.is_some() => return,
        None => canvas,
    };
    let Some(area) = area.intersect(&bounds.expand(1.0)) else {
        return;
    };

    let y_start = area.y.floor().max(0.0) as u32;
    let y_end = area.bottom().ceil() as u32;
    let mut crossings = Vec::with_capacity(points.len());

    for py in y_start..y_end {
        let sample_y = py as f32 + 0.5;
        if sample_y < area.y || sample_y > area.bottom() {
            continue;
        }

        crossings.clear();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            if (a.y <= sample_y && b.y > sample_y) || (b.y <= sample_y && a.y > sample_y) {
                let t = (sample_y - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(f32::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let from = pair[0].max(area.x);
            let to = pair[1].min(area.right());
            if from >= to {
                continue;
            }
            let x_start = (from - 0.5).ceil().max(0.0) as u32;
            let x_end = (to - 0.5).floor();
            if x_end < 0.0 {
                continue;
            }
            for px in x_start..=(x_end as u32) {
                fb.blend_pixel(px, py, color);
            }
        }
    }
}

/// Approximate a quadratic Bézier curve with `segments` straight pieces.
///
/// The start point is not repeated in the output.
#[must_use]
pub fn flatten_quadratic(from: Point, control: Point, to: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (1..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let a = from.lerp(control, t);
            let b = control.lerp(to, t);
            a.lerp(b, t)
        })
        .collect()
}

/// Regular polygon approximating a circle.
#[must_use]
pub fn circle_polygon(center: Point, radius: f32, segments: usize) -> Vec<Point> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / segments as f32;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> Framebuffer {
        let mut fb = Framebuffer::new(width, height).unwrap();
        fb.clear(Rgba::WHITE);
        fb
    }

    #[test]
    fn test_draw_line_horizontal() {
        let mut fb = white(20, 20);
        draw_line(&mut fb, 2, 5, 17, 5, Rgba::BLACK);
        for x in 2..=17 {
            assert_eq!(fb.get_pixel(x, 5), Some(Rgba::BLACK));
        }
        assert_eq!(fb.get_pixel(5, 6), Some(Rgba::WHITE));
    }

    #[test]
    fn test_draw_line_aa_touches_pixels() {
        let mut fb = white(50, 50);
        draw_line_aa(&mut fb, 5.0, 5.0, 45.0, 30.0, Rgba::BLACK);
        assert!(fb.count_non_background(Rgba::WHITE) > 40);
    }

    #[test]
    fn test_dashed_line_draws_less_than_solid() {
        let line = Line::from_coords(0.0, 10.5, 99.0, 10.5);

        let mut solid = white(100, 20);
        line.draw_aa(&mut solid, Rgba::BLACK);
        let mut dashed = white(100, 20);
        draw_dashed_line(&mut dashed, line, 5.0, 5.0, Rgba::BLACK);

        let solid_count = solid.count_non_background(Rgba::WHITE);
        let dashed_count = dashed.count_non_background(Rgba::WHITE);
        assert!(dashed_count > 0);
        assert!(dashed_count < solid_count);
    }

    #[test]
    fn test_clip_line_inside_is_unchanged() {
        let clip = Rect::new(0.0, 0.0, 100.0, 100.0);
        let line = Line::from_coords(10.0, 10.0, 90.0, 50.0);
        assert_eq!(clip_line(line, &clip), Some(line));
    }

    #[test]
    fn test_clip_line_crossing_edge() {
        let clip = Rect::new(0.0, 0.0, 100.0, 100.0);
        let clipped = clip_line(Line::from_coords(-50.0, 50.0, 50.0, 50.0), &clip).unwrap();
        assert!((clipped.start.x - 0.0).abs() < 1e-4);
        assert!((clipped.end.x - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_line_outside() {
        let clip = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(clip_line(Line::from_coords(-50.0, -5.0, 150.0, -5.0), &clip), None);
        assert_eq!(clip_line(Line::from_coords(110.0, 0.0, 120.0, 100.0), &clip), None);
    }

    #[test]
    fn test_draw_rect_negative_origin() {
        let mut fb = white(10, 10);
        draw_rect(&mut fb, -5, -5, 8, 8, Rgba::BLACK);
        assert_eq!(fb.get_pixel(2, 2), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(3, 3), Some(Rgba::WHITE));
    }

    #[test]
    fn test_fill_polygon_square() {
        let mut fb = white(20, 20);
        let square = [
            Point::new(5.0, 5.0),
            Point::new(15.0, 5.0),
            Point::new(15.0, 15.0),
            Point::new(5.0, 15.0),
        ];
        fill_polygon(&mut fb, &square, Rgba::BLACK, None);
        assert_eq!(fb.count_non_background(Rgba::WHITE), 100);
        assert_eq!(fb.get_pixel(10, 10), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(4, 10), Some(Rgba::WHITE));
    }

    #[test]
    fn test_fill_polygon_respects_clip() {
        let mut fb = white(20, 20);
        let square = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 20.0),
        ];
        let clip = Rect::new(0.0, 0.0, 10.0, 20.0);
        fill_polygon(&mut fb, &square, Rgba::BLACK, Some(&clip));
        assert_eq!(fb.count_non_background(Rgba::WHITE), 200);
        assert_eq!(fb.get_pixel(15, 10), Some(Rgba::WHITE));
    }

    #[test]
    fn test_fill_polygon_degenerate() {
        let mut fb = white(10, 10);
        fill_polygon(&mut fb, &[Point::new(1.0, 1.0), Point::new(5.0, 5.0)], Rgba::BLACK, None);
        fill_polygon(&mut fb, &[], Rgba::BLACK, None);
        assert_eq!(fb.count_non_background(Rgba::WHITE), 0);
    }

    #[test]
    fn test_flatten_quadratic_endpoints() {
        let pts = flatten_quadratic(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), 8);
        assert_eq!(pts.len(), 8);
        let last = pts[7];
        assert!((last.x - 10.0).abs() < 1e-5 && (last.y - 10.0).abs() < 1e-5);
        // the curve bulges towards the control point
        assert!(pts[3].x > 5.0 && pts[3].y < 5.0);
    }

    #[test]
    fn test_circle_polygon_radius() {
        let center = Point::new(5.0, 5.0);
        for p in circle_polygon(center, 3.0, 16) {
            assert!((p.distance(center) - 3.0).abs() < 1e-4);
        }
    }
}
