//! Figure and axes: data-space drawing with a tight bounding box.
//!
//! A [`Figure`] collects marks in data coordinates. Pixel positions are only
//! computed when the figure is measured or rendered, so axis limits may be
//! changed at any time before that. Data artists (points, lines, bars,
//! patches) are clipped to the axes area; text is not, which is how labels
//! left of the axis and headers above it stay visible. Rendering crops the
//! canvas to the union of everything drawn plus a small padding.

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::framebuffer::{Framebuffer, MAX_DIMENSION};
use crate::geometry::{Line, Point, Rect};
use crate::marker::{points_to_px, MarkerShape};
use crate::output::{PngEncoder, SvgElement, SvgEncoder, TextAnchor};
use crate::render::{clip_line, draw_dashed_line, fill_polygon, flatten_quadratic, Drawable};
use crate::scale::{nice_ticks, LinearScale, Scale};
use std::fmt::Write as _;
use std::path::Path;

/// Default resolution in dots per inch.
pub const DEFAULT_DPI: f32 = 100.0;

/// Axes area as fractions of the figure (left, right, bottom, top).
const SUBPLOT: (f32, f32, f32, f32) = (0.125, 0.9, 0.11, 0.88);

/// Padding around the tight bounding box, in inches.
const PAD_INCHES: f32 = 0.1;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.6;

/// Major tick length and label gap, in points.
const TICK_LENGTH_PT: f32 = 3.5;
const TICK_LABEL_SIZE_PT: f32 = 10.0;

/// Segments used when flattening a quadratic curve for rasterisation.
const CURVE_SEGMENTS: usize = 12;

/// Stroke pattern of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    /// Continuous.
    #[default]
    Solid,
    /// Long dashes.
    Dashed,
    /// Dots.
    Dotted,
}

impl LineStyle {
    /// On/off lengths in pixels for a stroke `width` pixels wide.
    #[must_use]
    pub fn dash(self, width: f32) -> Option<(f32, f32)> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some((3.7 * width, 1.6 * width)),
            Self::Dotted => Some((width, 1.65 * width)),
        }
    }
}

/// Appearance of a polyline or reference line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// Colour (alpha included).
    pub color: Rgba,
    /// Width in points.
    pub width_pt: f32,
    /// Dash pattern.
    pub style: LineStyle,
    /// Paint order; lower is drawn first.
    pub zorder: f32,
}

impl Stroke {
    /// Solid 1.5 pt line.
    #[must_use]
    pub fn new(color: Rgba) -> Self {
        Self {
            color,
            width_pt: 1.5,
            style: LineStyle::Solid,
            zorder: 2.0,
        }
    }

    /// Set the dash pattern.
    #[must_use]
    pub fn style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the width in points.
    #[must_use]
    pub fn width(mut self, width_pt: f32) -> Self {
        self.width_pt = width_pt;
        self
    }

    /// Multiply the colour's alpha.
    #[must_use]
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.color = self.color.fade(alpha);
        self
    }

    /// Set the paint order.
    #[must_use]
    pub fn zorder(mut self, zorder: f32) -> Self {
        self.zorder = zorder;
        self
    }
}

/// Appearance of a scatter marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Shape.
    pub shape: MarkerShape,
    /// Area in pt².
    pub area: f32,
    /// Fill (or stroke colour for stroked shapes).
    pub color: Rgba,
    /// Optional outline colour.
    pub edge: Option<Rgba>,
}

impl MarkerStyle {
    /// Circle of area `s = 36` pt².
    #[must_use]
    pub fn new(color: Rgba) -> Self {
        Self {
            shape: MarkerShape::Circle,
            area: 36.0,
            color,
            edge: None,
        }
    }

    /// Set the shape.
    #[must_use]
    pub fn shape(mut self, shape: MarkerShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the area in pt².
    #[must_use]
    pub fn area(mut self, area: f32) -> Self {
        self.area = area;
        self
    }

    /// Set the outline colour.
    #[must_use]
    pub fn edge(mut self, edge: Option<Rgba>) -> Self {
        self.edge = edge;
        self
    }
}

/// Appearance of an annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size_pt: f32,
    /// Colour.
    pub color: Rgba,
    /// Bold weight.
    pub bold: bool,
    /// Outline drawn around the text.
    pub boxed: Option<Rgba>,
}

impl TextStyle {
    /// Regular 10 pt text.
    #[must_use]
    pub fn new(color: Rgba) -> Self {
        Self {
            size_pt: 10.0,
            color,
            bold: false,
            boxed: None,
        }
    }

    /// Set the font size in points.
    #[must_use]
    pub fn size(mut self, size_pt: f32) -> Self {
        self.size_pt = size_pt;
        self
    }

    /// Use bold weight.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Draw an outline box around the text.
    #[must_use]
    pub fn boxed(mut self, color: Rgba) -> Self {
        self.boxed = Some(color);
        self
    }
}

/// One step of a patch outline, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new sub-path.
    MoveTo(f32, f32),
    /// Straight segment.
    LineTo(f32, f32),
    /// Quadratic Bézier segment.
    QuadTo {
        /// Control point.
        ctrl: (f32, f32),
        /// End point.
        to: (f32, f32),
    },
    /// Close the current sub-path.
    Close,
}

/// Something drawn on the figure, in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// Connected segments.
    Polyline {
        /// Vertices.
        points: Vec<(f32, f32)>,
        /// Appearance.
        stroke: Stroke,
    },
    /// Vertical line spanning the full axes height.
    VLine {
        /// Position.
        x: f32,
        /// Appearance.
        stroke: Stroke,
    },
    /// Scatter point.
    Marker {
        /// Position.
        x: f32,
        /// Position.
        y: f32,
        /// Appearance.
        style: MarkerStyle,
    },
    /// Filled outline.
    Patch {
        /// Outline.
        path: Vec<PathCommand>,
        /// Fill colour.
        fill: Rgba,
    },
    /// Annotation anchored at its left baseline.
    Text {
        /// Position.
        x: f32,
        /// Position.
        y: f32,
        /// Content.
        text: String,
        /// Appearance.
        style: TextStyle,
    },
}

impl Mark {
    fn zorder(&self) -> f32 {
        match self {
            Self::Polyline { stroke, .. } | Self::VLine { stroke, .. } => stroke.zorder,
            Self::Marker { .. } | Self::Patch { .. } => 1.0,
            Self::Text { .. } => 3.0,
        }
    }
}

/// Which frame lines of the axes are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spines {
    /// Top frame line.
    pub top: bool,
    /// Right frame line.
    pub right: bool,
    /// Bottom frame line.
    pub bottom: bool,
    /// Left frame line.
    pub left: bool,
}

impl Default for Spines {
    fn default() -> Self {
        Self {
            top: true,
            right: true,
            bottom: true,
            left: true,
        }
    }
}

impl Spines {
    /// Only the bottom frame line.
    #[must_use]
    pub fn bottom_only() -> Self {
        Self {
            top: false,
            right: false,
            bottom: true,
            left: false,
        }
    }

    /// No frame at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            top: false,
            right: false,
            bottom: false,
            left: false,
        }
    }
}

/// Data limits and their pixel area.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    /// Horizontal data limits.
    pub xlim: (f32, f32),
    /// Vertical data limits.
    pub ylim: (f32, f32),
    /// Frame lines.
    pub spines: Spines,
    /// Draw ticks and labels along the bottom.
    pub show_x_axis: bool,
    /// Draw ticks and labels along the left.
    pub show_y_axis: bool,
    area: Rect,
}

impl Axes {
    /// Pixel area of the axes.
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    fn scales(&self) -> Result<(LinearScale, LinearScale)> {
        let x = LinearScale::new(self.xlim, (self.area.x, self.area.right()))?;
        let y = LinearScale::new(self.ylim, (self.area.bottom(), self.area.y))?;
        Ok((x, y))
    }

    /// Map a data position to pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScaleDomain`] when a limit pair is degenerate.
    pub fn to_pixel(&self, x: f32, y: f32) -> Result<Point> {
        let (sx, sy) = self.scales()?;
        Ok(Point::new(sx.scale(x), sy.scale(y)))
    }

    /// Pixels per data unit along x.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScaleDomain`] when the x limits are degenerate.
    pub fn px_per_x(&self) -> Result<f32> {
        Ok(self.scales()?.0.factor())
    }
}

/// Estimated pixel width of `text` at `size_px`.
#[must_use]
pub fn text_width_px(text: &str, size_px: f32) -> f32 {
    text.chars().count() as f32 * GLYPH_ADVANCE * size_px
}

/// Box around left-baseline anchored text.
fn text_box(origin: Point, text: &str, size_px: f32) -> Rect {
    Rect::new(
        origin.x,
        origin.y - 0.8 * size_px,
        text_width_px(text, size_px),
        size_px,
    )
}

/// Pixel-space shape ready for an encoder.
#[derive(Debug, Clone)]
enum Shape {
    Segments {
        points: Vec<Point>,
        color: Rgba,
        width: f32,
        style: LineStyle,
        clipped: bool,
    },
    Polygon {
        points: Vec<Point>,
        d: Option<String>,
        fill: Rgba,
        edge: Option<(Rgba, f32)>,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Rgba,
        edge: Option<(Rgba, f32)>,
    },
    Label {
        origin: Point,
        text: String,
        size: f32,
        color: Rgba,
        bold: bool,
        anchor: TextAnchor,
        frame: Option<(Rect, Rgba)>,
    },
}

impl Shape {
    fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Segments { points, width, .. } => Rect::bounding(points).map(|r| r.expand(width / 2.0)),
            Self::Polygon { points, .. } => Rect::bounding(points),
            Self::Circle { center, radius, .. } => Some(Rect::new(
                center.x - radius,
                center.y - radius,
                2.0 * radius,
                2.0 * radius,
            )),
            Self::Label {
                origin,
                text,
                size,
                anchor,
                frame,
                ..
            } => {
                let mut r = text_box(*origin, text, *size);
                match anchor {
                    TextAnchor::Start => {}
                    TextAnchor::Middle => r.x -= r.width / 2.0,
                    TextAnchor::End => r.x -= r.width,
                }
                Some(frame.map_or(r, |(f, _)| f.union(&r)))
            }
        }
    }

    fn is_clipped(&self) -> bool {
        !matches!(self, Self::Label { .. } | Self::Segments { clipped: false, .. })
    }
}

/// A chart canvas with a single set of axes.
#[derive(Debug, Clone)]
pub struct Figure {
    width_in: f32,
    height_in: f32,
    dpi: f32,
    axes: Axes,
    marks: Vec<Mark>,
}

impl Figure {
    /// Create a figure of `width_in × height_in` inches at `dpi`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] when the pixel size is zero.
    pub fn new(width_in: f32, height_in: f32, dpi: f32) -> Result<Self> {
        let width = (width_in * dpi).round();
        let height = (height_in * dpi).round();
        let max = MAX_DIMENSION as f32;
        if !(width >= 1.0 && height >= 1.0 && width <= max && height <= max) {
            return Err(Error::InvalidDimensions {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            });
        }

        let (left, right, bottom, top) = SUBPLOT;
        let area = Rect::new(
            left * width,
            (1.0 - top) * height,
            (right - left) * width,
            (top - bottom) * height,
        );

        Ok(Self {
            width_in,
            height_in,
            dpi,
            axes: Axes {
                xlim: (0.0, 1.0),
                ylim: (0.0, 1.0),
                spines: Spines::default(),
                show_x_axis: true,
                show_y_axis: true,
                area,
            },
            marks: Vec::new(),
        })
    }

    /// Nominal size in pixels before cropping.
    #[must_use]
    pub fn size_px(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi).round() as u32,
            (self.height_in * self.dpi).round() as u32,
        )
    }

    /// Resolution.
    #[must_use]
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// The axes.
    #[must_use]
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Set horizontal limits.
    pub fn set_xlim(&mut self, lo: f32, hi: f32) {
        self.axes.xlim = (lo, hi);
    }

    /// Set vertical limits.
    pub fn set_ylim(&mut self, lo: f32, hi: f32) {
        self.axes.ylim = (lo, hi);
    }

    /// Choose which frame lines are drawn.
    pub fn set_spines(&mut self, spines: Spines) {
        self.axes.spines = spines;
    }

    /// Show or hide tick marks and labels per axis.
    pub fn set_axis_visible(&mut self, x: bool, y: bool) {
        self.axes.show_x_axis = x;
        self.axes.show_y_axis = y;
    }

    /// Everything drawn so far, in insertion order.
    #[must_use]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Font size in pixels.
    #[must_use]
    pub fn font_px(&self, size_pt: f32) -> f32 {
        points_to_px(size_pt, self.dpi)
    }

    /// Scatter points.
    pub fn scatter(&mut self, x: f32, y: f32, style: MarkerStyle) {
        self.marks.push(Mark::Marker { x, y, style });
    }

    /// Polyline through `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataLengthMismatch`] when the slices differ in length.
    pub fn plot(&mut self, xs: &[f32], ys: &[f32], stroke: Stroke) -> Result<()> {
        if xs.len() != ys.len() {
            return Err(Error::DataLengthMismatch {
                what: "y values",
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        let points = xs.iter().copied().zip(ys.iter().copied()).collect();
        self.marks.push(Mark::Polyline { points, stroke });
        Ok(())
    }

    /// Vertical reference line across the whole axes.
    pub fn axvline(&mut self, x: f32, stroke: Stroke) {
        self.marks.push(Mark::VLine { x, stroke });
    }

    /// Bar centred on `x`, from 0 to `height` (negative heights go down).
    pub fn bar(&mut self, x: f32, height: f32, width: f32, fill: Rgba) {
        let (x0, x1) = (x - width / 2.0, x + width / 2.0);
        self.path_patch(
            vec![
                PathCommand::MoveTo(x0, 0.0),
                PathCommand::LineTo(x0, height),
                PathCommand::LineTo(x1, height),
                PathCommand::LineTo(x1, 0.0),
                PathCommand::Close,
            ],
            fill,
        );
    }

    /// Filled outline.
    pub fn path_patch(&mut self, path: Vec<PathCommand>, fill: Rgba) {
        self.marks.push(Mark::Patch { path, fill });
    }

    /// Annotation with its left baseline at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, style: TextStyle) {
        self.marks.push(Mark::Text {
            x,
            y,
            text: text.into(),
            style,
        });
    }

    /// Convert every mark and the axis decorations to pixel shapes, in paint order.
    fn shapes(&self) -> Result<Vec<Shape>> {
        let (sx, sy) = self.axes.scales()?;
        let px = |x: f32, y: f32| Point::new(sx.scale(x), sy.scale(y));
        let area = self.axes.area;

        let mut ordered: Vec<&Mark> = self.marks.iter().collect();
        ordered.sort_by(|a, b| a.zorder().total_cmp(&b.zorder()));

        let mut shapes = Vec::with_capacity(ordered.len() + 16);
        for mark in ordered {
            match mark {
                Mark::Polyline { points, stroke } => shapes.push(Shape::Segments {
                    points: points.iter().map(|&(x, y)| px(x, y)).collect(),
                    color: stroke.color,
                    width: self.font_px(stroke.width_pt),
                    style: stroke.style,
                    clipped: true,
                }),
                Mark::VLine { x, stroke } => {
                    let at = sx.scale(*x);
                    shapes.push(Shape::Segments {
                        points: vec![Point::new(at, area.y), Point::new(at, area.bottom())],
                        color: stroke.color,
                        width: self.font_px(stroke.width_pt),
                        style: stroke.style,
                        clipped: true,
                    });
                }
                Mark::Marker { x, y, style } => {
                    shapes.extend(self.marker_shapes(px(*x, *y), style));
                }
                Mark::Patch { path, fill } => {
                    let (points, d) = flatten_path(path, &px);
                    shapes.push(Shape::Polygon {
                        points,
                        d: Some(d),
                        fill: *fill,
                        edge: None,
                    });
                }
                Mark::Text { x, y, text, style } => {
                    let origin = px(*x, *y);
                    let size = self.font_px(style.size_pt);
                    let frame = style.boxed.map(|c| (text_box(origin, text, size).expand(0.3 * size), c));
                    shapes.push(Shape::Label {
                        origin,
                        text: text.clone(),
                        size,
                        color: style.color,
                        bold: style.bold,
                        anchor: TextAnchor::Start,
                        frame,
                    });
                }
            }
        }

        shapes.extend(self.axis_shapes()?);
        Ok(shapes)
    }

    fn marker_shapes(&self, center: Point, style: &MarkerStyle) -> Vec<Shape> {
        let size = crate::marker::marker_diameter(style.area, self.dpi);
        let edge = style.edge.map(|c| (c, self.font_px(1.0)));
        match style.shape {
            MarkerShape::Circle => vec![Shape::Circle {
                center,
                radius: size / 2.0,
                fill: style.color,
                edge,
            }],
            shape if shape.is_stroked() => shape
                .strokes(center, size)
                .into_iter()
                .map(|(a, b)| Shape::Segments {
                    points: vec![a, b],
                    color: style.color,
                    width: self.font_px(1.5),
                    style: LineStyle::Solid,
                    clipped: true,
                })
                .collect(),
            shape => vec![Shape::Polygon {
                points: shape.outline(center, size),
                d: None,
                fill: style.color,
                edge,
            }],
        }
    }

    fn axis_shapes(&self) -> Result<Vec<Shape>> {
        let area = self.axes.area;
        let spines = self.axes.spines;
        let frame_color = Rgba::BLACK;
        let width = self.font_px(0.8);
        let mut shapes = Vec::new();

        let mut edge = |on: bool, a: Point, b: Point| {
            if on {
                shapes.push(Shape::Segments {
                    points: vec![a, b],
                    color: frame_color,
                    width,
                    style: LineStyle::Solid,
                    clipped: false,
                });
            }
        };
        let (tl, tr) = (Point::new(area.x, area.y), Point::new(area.right(), area.y));
        let (bl, br) = (
            Point::new(area.x, area.bottom()),
            Point::new(area.right(), area.bottom()),
        );
        edge(spines.top, tl, tr);
        edge(spines.right, tr, br);
        edge(spines.bottom, bl, br);
        edge(spines.left, tl, bl);

        let (sx, sy) = self.axes.scales()?;
        let tick = self.font_px(TICK_LENGTH_PT);
        let label_size = self.font_px(TICK_LABEL_SIZE_PT);

        if self.axes.show_x_axis {
            let (lo, hi) = ordered(self.axes.xlim);
            let ticks = nice_ticks(lo, hi, 8)?;
            for (value, label) in ticks.values.iter().zip(ticks.labels()) {
                let x = sx.scale(*value);
                shapes.push(tick_segment(Point::new(x, area.bottom()), Point::new(x, area.bottom() + tick), frame_color, width));
                shapes.push(Shape::Label {
                    origin: Point::new(x, area.bottom() + 2.0 * tick + 0.8 * label_size),
                    text: label,
                    size: label_size,
                    color: frame_color,
                    bold: false,
                    anchor: TextAnchor::Middle,
                    frame: None,
                });
            }
        }

        if self.axes.show_y_axis {
            let (lo, hi) = ordered(self.axes.ylim);
            let ticks = nice_ticks(lo, hi, 6)?;
            for (value, label) in ticks.values.iter().zip(ticks.labels()) {
                let y = sy.scale(*value);
                shapes.push(tick_segment(Point::new(area.x - tick, y), Point::new(area.x, y), frame_color, width));
                shapes.push(Shape::Label {
                    origin: Point::new(area.x - 2.0 * tick, y + 0.3 * label_size),
                    text: label,
                    size: label_size,
                    color: frame_color,
                    bold: false,
                    anchor: TextAnchor::End,
                    frame: None,
                });
            }
        }

        Ok(shapes)
    }

    /// Tight bounding box of everything drawn, including the axes area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScaleDomain`] when the axis limits are degenerate.
    pub fn bounds(&self) -> Result<Rect> {
        let shapes = self.shapes()?;
        Ok(tight_bounds(&self.axes.area, &shapes, self.reach()))
    }

    /// Render as SVG, cropped to the tight bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScaleDomain`] when the axis limits are degenerate.
    pub fn to_svg(&self) -> Result<SvgEncoder> {
        let shapes = self.shapes()?;
        let (canvas, dx, dy) = self.canvas(&shapes)?;
        let clip = Rect::new(self.axes.area.x + dx, self.axes.area.y + dy, self.axes.area.width, self.axes.area.height);

        let mut encoder = SvgEncoder::new(canvas.0, canvas.1);
        let mut group: Vec<SvgElement> = Vec::new();
        for shape in &shapes {
            let elements = svg_elements(shape, dx, dy);
            if shape.is_clipped() {
                group.extend(elements);
            } else {
                flush_group(&mut encoder, &mut group, clip);
                for element in elements {
                    encoder.add_element(element);
                }
            }
        }
        flush_group(&mut encoder, &mut group, clip);
        Ok(encoder)
    }

    /// Rasterise the geometry (annotations are not rasterised).
    ///
    /// # Errors
    ///
    /// Returns an error when the axis limits are degenerate.
    pub fn to_framebuffer(&self) -> Result<Framebuffer> {
        let shapes = self.shapes()?;
        let (canvas, dx, dy) = self.canvas(&shapes)?;
        let clip = Rect::new(self.axes.area.x + dx, self.axes.area.y + dy, self.axes.area.width, self.axes.area.height);

        let mut fb = Framebuffer::new(canvas.0, canvas.1)?;
        fb.clear(Rgba::WHITE);
        for shape in &shapes {
            let clip = shape.is_clipped().then_some(&clip);
            rasterize(&mut fb, shape, dx, dy, clip);
        }
        Ok(fb)
    }

    /// Write the figure; the encoder follows the extension (`svg` or `png`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for other extensions, or the
    /// encoder's error.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "svg" => self.to_svg()?.write_to_file(path)?,
            "png" => PngEncoder::write_to_file(&self.to_framebuffer()?, path)?,
            _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
        }
        tracing::info!(path = %path.display(), marks = self.marks.len(), "chart written");
        Ok(())
    }

    /// How far outside the axes unclipped artists may grow the tight box.
    fn reach(&self) -> f32 {
        let (width, height) = self.size_px();
        width.max(height) as f32
    }

    /// Output size and the translation that moves the tight box to the padding.
    fn canvas(&self, shapes: &[Shape]) -> Result<((u32, u32), f32, f32)> {
        let bounds = tight_bounds(&self.axes.area, shapes, self.reach());
        if ![bounds.x, bounds.y, bounds.width, bounds.height].iter().all(|v| v.is_finite()) {
            return Err(Error::ScaleDomain("figure bounds are not finite".into()));
        }
        let pad = PAD_INCHES * self.dpi;
        let width = (bounds.width + 2.0 * pad).ceil().max(1.0);
        let height = (bounds.height + 2.0 * pad).ceil().max(1.0);
        let max = MAX_DIMENSION as f32;
        if width > max || height > max {
            return Err(Error::InvalidDimensions {
                width: width as u32,
                height: height as u32,
            });
        }
        Ok(((width as u32, height as u32), pad - bounds.x, pad - bounds.y))
    }
}

fn ordered((a, b): (f32, f32)) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn tick_segment(a: Point, b: Point, color: Rgba, width: f32) -> Shape {
    Shape::Segments {
        points: vec![a, b],
        color,
        width,
        style: LineStyle::Solid,
        clipped: false,
    }
}

/// Union of the axes area and every shape; clipped shapes only count inside the axes.
/// Union of the axes and every artist, cropped to `reach` pixels around the axes.
fn tight_bounds(area: &Rect, shapes: &[Shape], reach: f32) -> Rect {
    let limit = area.expand(reach);
    shapes.iter().fold(*area, |acc, shape| {
        let Some(b) = shape.bounds().filter(|b| {
            [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite())
        }) else {
            return acc;
        };
        let within = if shape.is_clipped() { area } else { &limit };
        b.intersect(within).map_or(acc, |b| acc.union(&b))
    })
}

/// Pixel polygon (curves flattened) and SVG path data for a patch.
fn flatten_path(path: &[PathCommand], px: &impl Fn(f32, f32) -> Point) -> (Vec<Point>, String) {
    let mut points = Vec::with_capacity(path.len() + CURVE_SEGMENTS);
    let mut d = String::new();
    for command in path {
        match *command {
            PathCommand::MoveTo(x, y) => {
                let p = px(x, y);
                let _ = write!(d, "M {} {} ", p.x, p.y);
                points.push(p);
            }
            PathCommand::LineTo(x, y) => {
                let p = px(x, y);
                let _ = write!(d, "L {} {} ", p.x, p.y);
                points.push(p);
            }
            PathCommand::QuadTo { ctrl, to } => {
                let c = px(ctrl.0, ctrl.1);
                let t = px(to.0, to.1);
                let _ = write!(d, "Q {} {} {} {} ", c.x, c.y, t.x, t.y);
                let from = points.last().copied().unwrap_or(c);
                points.extend(flatten_quadratic(from, c, t, CURVE_SEGMENTS));
            }
            PathCommand::Close => d.push('Z'),
        }
    }
    (points, d.trim_end().to_string())
}

fn flush_group(encoder: &mut SvgEncoder, group: &mut Vec<SvgElement>, clip: Rect) {
    if group.is_empty() {
        return;
    }
    encoder.add_element(SvgElement::Group {
        clip: Some(clip),
        elements: std::mem::take(group),
    });
}

fn svg_elements(shape: &Shape, dx: f32, dy: f32) -> Vec<SvgElement> {
    let shift = |p: &Point| (p.x + dx, p.y + dy);
    match shape {
        Shape::Segments {
            points,
            color,
            width,
            style,
            ..
        } => {
            let dash = style.dash(*width);
            if let [a, b] = points.as_slice() {
                let (x1, y1) = shift(a);
                let (x2, y2) = shift(b);
                vec![SvgElement::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke: *color,
                    stroke_width: *width,
                    dash,
                }]
            } else {
                vec![SvgElement::Polyline {
                    points: points.iter().map(shift).collect(),
                    stroke: Some(*color),
                    stroke_width: *width,
                    fill: None,
                    dash,
                }]
            }
        }
        Shape::Polygon { points, d, fill, edge } => match d {
            Some(d) => vec![SvgElement::Path {
                d: translate_path(d, dx, dy),
                fill: Some(*fill),
                stroke: edge.map(|(c, _)| c),
                stroke_width: edge.map_or(0.0, |(_, w)| w),
            }],
            None => vec![SvgElement::Polyline {
                points: points.iter().map(shift).collect(),
                stroke: edge.map(|(c, _)| c),
                stroke_width: edge.map_or(0.0, |(_, w)| w),
                fill: Some(*fill),
                dash: None,
            }],
        },
        Shape::Circle {
            center,
            radius,
            fill,
            edge,
        } => {
            let (cx, cy) = shift(center);
            vec![SvgElement::Circle {
                cx,
                cy,
                r: *radius,
                fill: *fill,
                stroke: edge.map(|(c, _)| c),
                stroke_width: edge.map_or(0.0, |(_, w)| w),
            }]
        }
        Shape::Label {
            origin,
            text,
            size,
            color,
            bold,
            anchor,
            frame,
        } => {
            let mut out = Vec::with_capacity(2);
            if let Some((rect, stroke)) = frame {
                out.push(SvgElement::Rect {
                    x: rect.x + dx,
                    y: rect.y + dy,
                    width: rect.width,
                    height: rect.height,
                    fill: None,
                    stroke: Some(*stroke),
                    stroke_width: 1.0,
                });
            }
            let (x, y) = shift(origin);
            out.push(SvgElement::Text {
                x,
                y,
                text: text.clone(),
                font_size: *size,
                fill: *color,
                anchor: *anchor,
                bold: *bold,
            });
            out
        }
    }
}

/// Shift every coordinate pair of a path built by [`flatten_path`].
fn translate_path(d: &str, dx: f32, dy: f32) -> String {
    let mut out = Vec::new();
    let mut pending_x: Option<f32> = None;
    for token in d.split_whitespace() {
        match token.parse::<f32>() {
            Ok(v) => match pending_x.take() {
                None => pending_x = Some(v),
                Some(x) => {
                    out.push((x + dx).to_string());
                    out.push((v + dy).to_string());
                }
            },
            Err(_) => out.push(token.to_string()),
        }
    }
    out.join(" ")
}

fn rasterize(fb: &mut Framebuffer, shape: &Shape, dx: f32, dy: f32, clip: Option<&Rect>) {
    let shift = |p: &Point| p.offset(dx, dy);
    match shape {
        Shape::Segments {
            points,
            color,
            width,
            style,
            ..
        } => {
            for pair in points.windows(2) {
                let line = Line::new(shift(&pair[0]), shift(&pair[1]));
                let line = match clip {
                    Some(c) => match clip_line(line, c) {
                        Some(l) => l,
                        None => continue,
                    },
                    None => line,
                };
                match style.dash(*width) {
                    Some((on, off)) => draw_dashed_line(fb, line, on, off, *color),
                    None if line.start.x == line.end.x || line.start.y == line.end.y => {
                        line.draw(fb, *color);
                    }
                    None => line.draw_aa(fb, *color),
                }
            }
        }
        Shape::Polygon { points, fill, edge, .. } => {
            let points: Vec<Point> = points.iter().map(shift).collect();
            fill_polygon(fb, &points, *fill, clip);
            if let Some((color, _)) = edge {
                outline(fb, &points, *color, clip);
            }
        }
        Shape::Circle {
            center,
            radius,
            fill,
            edge,
        } => {
            let points = crate::render::circle_polygon(shift(center), *radius, 24);
            fill_polygon(fb, &points, *fill, clip);
            if let Some((color, _)) = edge {
                outline(fb, &points, *color, clip);
            }
        }
        Shape::Label { frame: Some((rect, edge)), .. } => {
            // text itself only exists in SVG output
            let rect = Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height);
            rect.draw(fb, Rgba::WHITE);
            let corners = [
                Point::new(rect.x, rect.y),
                Point::new(rect.right(), rect.y),
                Point::new(rect.right(), rect.bottom()),
                Point::new(rect.x, rect.bottom()),
            ];
            outline(fb, &corners, *edge, None);
        }
        Shape::Label { .. } => {}
    }
}

fn outline(fb: &mut Framebuffer, points: &[Point], color: Rgba, clip: Option<&Rect>) {
    for (i, a) in points.iter().enumerate() {
        let line = Line::new(*a, points[(i + 1) % points.len()]);
        let line = match clip {
            Some(c) => clip_line(line, c),
            None => Some(line),
        };
        if let Some(line) = line {
            line.draw_aa(fb, color);
        }
    }
}
