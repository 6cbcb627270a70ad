//! SVG output encoder.
//!
//! Vector output is the primary chart format: it keeps every annotation as
//! real text, which the raster preview cannot.

use crate::color::Rgba;
use crate::error::Result;
use crate::geometry::Rect;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG encoder for vector output.
#[derive(Debug, Clone)]
pub struct SvgEncoder {
    /// SVG width
    width: u32,
    /// SVG height
    height: u32,
    /// Background color (None for transparent)
    background: Option<Rgba>,
    /// SVG elements
    elements: Vec<SvgElement>,
}

/// An SVG element.
///
/// Field names are self-documenting and match SVG attribute names.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum SvgElement {
    /// Rectangle
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgba>,
        stroke: Option<Rgba>,
        stroke_width: f32,
    },
    /// Circle
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: Rgba,
        stroke: Option<Rgba>,
        stroke_width: f32,
    },
    /// Line, optionally dashed (`dash` = on/off lengths)
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Rgba,
        stroke_width: f32,
        dash: Option<(f32, f32)>,
    },
    /// Polyline (connected line segments), closed into a polygon when filled
    Polyline {
        points: Vec<(f32, f32)>,
        stroke: Option<Rgba>,
        stroke_width: f32,
        fill: Option<Rgba>,
        dash: Option<(f32, f32)>,
    },
    /// Path (SVG path data)
    Path {
        d: String,
        fill: Option<Rgba>,
        stroke: Option<Rgba>,
        stroke_width: f32,
    },
    /// Text
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        fill: Rgba,
        anchor: TextAnchor,
        bold: bool,
    },
    /// Elements clipped to a rectangle
    Group {
        clip: Option<Rect>,
        elements: Vec<SvgElement>,
    },
}

/// Text anchor position for SVG text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TextAnchor {
    /// Align text start at position (left-aligned for LTR)
    #[default]
    Start,
    /// Center text at position
    Middle,
    /// Align text end at position (right-aligned for LTR)
    End,
}

impl Default for SvgEncoder {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SvgEncoder {
    /// Create a new SVG encoder with given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Some(Rgba::WHITE),
            elements: Vec::new(),
        }
    }

    /// Set background color (None for transparent).
    #[must_use]
    pub fn background(mut self, color: Option<Rgba>) -> Self {
        self.background = color;
        self
    }

    /// Add a filled rectangle.
    #[must_use]
    pub fn rect(mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            stroke: None,
            stroke_width: 1.0,
        });
        self
    }

    /// Add a circle.
    #[must_use]
    pub fn circle(mut self, cx: f32, cy: f32, r: f32, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Circle {
            cx,
            cy,
            r,
            fill,
            stroke: None,
            stroke_width: 1.0,
        });
        self
    }

    /// Add a solid line.
    #[must_use]
    pub fn line(
        mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Rgba,
        stroke_width: f32,
    ) -> Self {
        self.elements.push(SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
            dash: None,
        });
        self
    }

    /// Add a filled polygon.
    #[must_use]
    pub fn polygon(mut self, points: &[(f32, f32)], fill: Rgba, stroke: Option<Rgba>) -> Self {
        self.elements.push(SvgElement::Polyline {
            points: points.to_vec(),
            stroke,
            stroke_width: 1.0,
            fill: Some(fill),
            dash: None,
        });
        self
    }

    /// Add an SVG path.
    #[must_use]
    pub fn path(mut self, d: &str, fill: Option<Rgba>, stroke: Option<Rgba>, stroke_width: f32) -> Self {
        self.elements.push(SvgElement::Path {
            d: d.to_string(),
            fill,
            stroke,
            stroke_width,
        });
        self
    }

    /// Add start-anchored text.
    #[must_use]
    pub fn text(mut self, x: f32, y: f32, text: &str, font_size: f32, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Text {
            x,
            y,
            text: text.to_string(),
            font_size,
            fill,
            anchor: TextAnchor::Start,
            bold: false,
        });
        self
    }

    /// Add a raw element.
    pub fn add_element(&mut self, element: SvgElement) {
        self.elements.push(element);
    }

    /// Number of top-level elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element was added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render to SVG string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(4096);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        );

        // Clip paths have to be declared before use
        let mut clips = Vec::new();
        collect_clips(&self.elements, &mut clips);
        if !clips.is_empty() {
            svg.push_str("  <defs>\n");
            for (id, clip) in clips.iter().enumerate() {
                let _ = writeln!(
                    svg,
                    r#"    <clipPath id="clip{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
                    clip.x, clip.y, clip.width, clip.height
                );
            }
            svg.push_str("  </defs>\n");
        }

        if let Some(bg) = self.background {
            let _ = writeln!(
                svg,
                r#"  <rect width="100%" height="100%" fill="{}"/>"#,
                rgba_to_css(&bg)
            );
        }

        let mut next_clip = 0;
        for element in &self.elements {
            write_element(&mut svg, element, 1, &mut next_clip);
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}

fn collect_clips(elements: &[SvgElement], out: &mut Vec<Rect>) {
    for element in elements {
        if let SvgElement::Group { clip, elements } = element {
            if let Some(rect) = clip {
                out.push(*rect);
            }
            collect_clips(elements, out);
        }
    }
}

/// Convert RGBA to CSS color string.
fn rgba_to_css(color: &Rgba) -> String {
    if color.a == 255 {
        format!("rgb({},{},{})", color.r, color.g, color.b)
    } else {
        format!(
            "rgba({},{},{},{:.3})",
            color.r,
            color.g,
            color.b,
            f32::from(color.a) / 255.0
        )
    }
}

fn paint_attr(name: &str, color: Option<Rgba>) -> String {
    let value = color.map_or_else(|| "none".to_string(), |c| rgba_to_css(&c));
    format!(r#" {name}="{value}""#)
}

fn stroke_attrs(stroke: Option<Rgba>, stroke_width: f32, dash: Option<(f32, f32)>) -> String {
    let Some(s) = stroke else {
        return String::new();
    };
    let mut attrs = format!(
        r#" stroke="{}" stroke-width="{}""#,
        rgba_to_css(&s),
        stroke_width
    );
    if let Some((on, off)) = dash {
        let _ = write!(attrs, r#" stroke-dasharray="{on},{off}""#);
    }
    attrs
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_element(svg: &mut String, element: &SvgElement, depth: usize, next_clip: &mut usize) {
    let indent = "  ".repeat(depth);
    match element {
        SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                r#"{indent}<rect x="{x}" y="{y}" width="{width}" height="{height}"{}{}/>"#,
                paint_attr("fill", *fill),
                stroke_attrs(*stroke, *stroke_width, None)
            );
        }
        SvgElement::Circle {
            cx,
            cy,
            r,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                r#"{indent}<circle cx="{cx}" cy="{cy}" r="{r}"{}{}/>"#,
                paint_attr("fill", Some(*fill)),
                stroke_attrs(*stroke, *stroke_width, None)
            );
        }
        SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
            dash,
        } => {
            let _ = writeln!(
                svg,
                r#"{indent}<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}"{}/>"#,
                stroke_attrs(Some(*stroke), *stroke_width, *dash)
            );
        }
        SvgElement::Polyline {
            points,
            stroke,
            stroke_width,
            fill,
            dash,
        } => {
            let points_str = points
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ");
            let tag = if fill.is_some() { "polygon" } else { "polyline" };
            let _ = writeln!(
                svg,
                r#"{indent}<{tag} points="{points_str}"{}{}/>"#,
                paint_attr("fill", *fill),
                stroke_attrs(*stroke, *stroke_width, *dash)
            );
        }
        SvgElement::Path {
            d,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                r#"{indent}<path d="{d}"{}{}/>"#,
                paint_attr("fill", *fill),
                stroke_attrs(*stroke, *stroke_width, None)
            );
        }
        SvgElement::Text {
            x,
            y,
            text,
            font_size,
            fill,
            anchor,
            bold,
        } => {
            let anchor_str = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            let weight = if *bold { r#" font-weight="bold""# } else { "" };
            let _ = writeln!(
                svg,
                r#"{indent}<text x="{x}" y="{y}" font-size="{font_size}" fill="{}" text-anchor="{anchor_str}" font-family="DejaVu Sans, sans-serif"{weight}>{}</text>"#,
                rgba_to_css(fill),
                escape_xml(text)
            );
        }
        SvgElement::Group { clip, elements } => {
            if clip.is_some() {
                let _ = writeln!(svg, r#"{indent}<g clip-path="url(#clip{next_clip})">"#);
                *next_clip += 1;
            } else {
                let _ = writeln!(svg, "{indent}<g>");
            }
            for child in elements {
                write_element(svg, child, depth + 1, next_clip);
            }
            let _ = writeln!(svg, "{indent}</g>");
        }
    }
}
