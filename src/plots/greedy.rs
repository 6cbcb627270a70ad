//! Greedy ranked dot plot.
//!
//! Row 0 is the factual score; row `i` is the score after the first `i`
//! greedy changes. A dashed connector joins the rows and a label left of the
//! axis names each change.

use super::{char_len, class_header, HeaderLayout};
use crate::color::{palette_color, Rgba, GREEDY_PALETTE};
use crate::error::{Error, Result};
use crate::figure::{Figure, LineStyle, MarkerStyle, Spines, Stroke, TextStyle, DEFAULT_DPI};
use crate::marker::MarkerShape;
use crate::report::GreedyData;
use tracing::debug;

const MARKER_AREA: f32 = 100.0;
const LABEL_SIZE_PT: f32 = 12.0;

/// Builder for the greedy chart.
#[derive(Debug, Clone)]
pub struct GreedyPlot<'a> {
    data: &'a GreedyData,
    threshold: f64,
    dpi: f32,
}

impl<'a> GreedyPlot<'a> {
    /// Chart for `data`.
    #[must_use]
    pub fn new(data: &'a GreedyData) -> Self {
        Self {
            data,
            threshold: 0.5,
            dpi: DEFAULT_DPI,
        }
    }

    /// Decision threshold (dashed red line).
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Output resolution.
    #[must_use]
    pub fn dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Lay out the chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyData`] when there are no steps.
    pub fn build(self) -> Result<Figure> {
        let steps = &self.data.steps;
        if steps.is_empty() {
            return Err(Error::EmptyData);
        }
        let n = steps.len() as f32;
        let t = self.threshold as f32;

        let mut fig = Figure::new(7.0, n, self.dpi)?;

        let scores: Vec<f32> = std::iter::once(self.data.factual_score)
            .chain(steps.iter().map(|s| s.score))
            .map(|s| s as f32)
            .collect();
        let rows: Vec<f32> = (0..scores.len()).map(|i| i as f32).collect();
        fig.plot(
            &scores,
            &rows,
            Stroke::new(Rgba::CONNECTOR_GREY)
                .style(LineStyle::Dashed)
                .zorder(0.0),
        )?;

        let mut labels = vec!["Factual".to_string()];
        for (i, (&score, &row)) in scores.iter().zip(&rows).enumerate() {
            let style = if i == 0 {
                MarkerStyle::new(row_color(0)).shape(MarkerShape::Plus)
            } else {
                let shape = MarkerShape::for_step(i - 1);
                let step = &steps[i - 1];
                labels.push(format!(
                    "{} - {} ({}➜{})",
                    shape.glyph(),
                    step.name,
                    step.factual,
                    step.counterfactual
                ));
                MarkerStyle::new(row_color(i))
                    .shape(shape)
                    .edge(Some(Rgba::LABEL_GREY))
            };
            fig.scatter(score, row, style.area(MARKER_AREA));
        }

        fig.axvline(
            t,
            Stroke::new(Rgba::THRESHOLD)
                .style(LineStyle::Dashed)
                .zorder(0.0),
        );

        let longest = labels.iter().map(|l| char_len(l)).fold(0.0, f32::max);
        let label_x = -0.02 * longest;
        for (i, label) in labels.iter().enumerate() {
            let row = i as f32;
            fig.text(
                label_x,
                row,
                label.as_str(),
                TextStyle::new(row_color(i)).size(LABEL_SIZE_PT),
            );
            if i > 1 {
                let applied: Vec<String> = (0..i - 1)
                    .map(|s| MarkerShape::for_step(s).glyph().to_string())
                    .collect();
                fig.text(
                    label_x,
                    row - 0.35,
                    format!("+{}", applied.join(",")),
                    TextStyle::new(Rgba::MUTED_GREY)
                        .size(LABEL_SIZE_PT)
                        .boxed(Rgba::MUTED_GREY),
                );
            }
        }

        let names = &self.data.class_names;
        class_header(
            &mut fig,
            names,
            &HeaderLayout {
                factual: t - 0.14 * char_len(&names.factual) / 8.0,
                arrow: t - 0.01,
                counterfactual: t + 0.02,
                y: (n + 1.0) * 1.025 - 0.9,
                size_pt: 10.0,
            },
        );

        fig.set_xlim(-0.05, 1.0);
        fig.set_ylim(-0.05 * n, 1.05 * n);
        fig.set_spines(Spines::bottom_only());
        fig.set_axis_visible(true, false);

        debug!(rows = scores.len(), longest_label = longest, "greedy chart laid out");
        Ok(fig)
    }
}

/// Grey for the factual row, then the step colours in turn.
fn row_color(row: usize) -> Rgba {
    if row == 0 {
        GREEDY_PALETTE[0]
    } else {
        palette_color(&GREEDY_PALETTE[1..], row - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Mark;
    use crate::report::{ClassNames, GreedyStep};

    fn data(steps: usize) -> GreedyData {
        GreedyData {
            factual_score: 0.2,
            steps: (0..steps)
                .map(|i| GreedyStep {
                    name: format!("feature_{i}"),
                    factual: "1.0".into(),
                    counterfactual: "2.0".into(),
                    score: 0.2 + 0.6 * (i + 1) as f64 / steps as f64,
                })
                .collect(),
            class_names: ClassNames::new("Bad", "Good"),
        }
    }

    fn texts(fig: &Figure) -> Vec<(f32, f32, String)> {
        fig.marks()
            .iter()
            .filter_map(|m| match m {
                Mark::Text { x, y, text, .. } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_steps() {
        let empty = data(0);
        assert!(matches!(GreedyPlot::new(&empty).build(), Err(Error::EmptyData)));
    }

    #[test]
    fn test_one_marker_per_row() {
        let fig = GreedyPlot::new(&data(3)).build().unwrap();
        let markers: Vec<(f32, MarkerShape)> = fig
            .marks()
            .iter()
            .filter_map(|m| match m {
                Mark::Marker { y, style, .. } => Some((*y, style.shape)),
                _ => None,
            })
            .collect();
        assert_eq!(
            markers,
            vec![
                (0.0, MarkerShape::Plus),
                (1.0, MarkerShape::Circle),
                (2.0, MarkerShape::TriangleUp),
                (3.0, MarkerShape::Square),
            ]
        );
        assert_eq!(fig.size_px(), (700, 300));
    }

    #[test]
    fn test_labels_and_applied_tags() {
        let fig = GreedyPlot::new(&data(3)).build().unwrap();
        let texts = texts(&fig);

        let labels: Vec<&str> = texts.iter().map(|(_, _, t)| t.as_str()).collect();
        assert!(labels.contains(&"Factual"));
        assert!(labels.contains(&"● - feature_0 (1.0➜2.0)"));
        assert!(labels.contains(&"+●"));
        assert!(labels.contains(&"+●,▲"));

        // longest label is 23 chars
        let (x, _, _) = texts.iter().find(|(_, _, t)| t == "Factual").unwrap();
        assert!((x - (-0.02 * 23.0)).abs() < 1e-5);
        let (_, y, _) = texts.iter().find(|(_, _, t)| t == "+●,▲").unwrap();
        assert!((y - 2.65).abs() < 1e-5);
    }

    #[test]
    fn test_class_header_positions() {
        let fig = GreedyPlot::new(&data(2)).threshold(0.5).build().unwrap();
        let texts = texts(&fig);
        let header_y = 3.0 * 1.025 - 0.9;

        let (x, y, _) = texts.iter().find(|(_, _, t)| t == "Bad").unwrap();
        assert!((x - (0.5 - 0.14 * 3.0 / 8.0)).abs() < 1e-5);
        assert!((y - header_y).abs() < 1e-5);
        let (x, _, _) = texts.iter().find(|(_, _, t)| t == "➜").unwrap();
        assert!((x - 0.49).abs() < 1e-5);
        let (x, _, _) = texts.iter().find(|(_, _, t)| t == "Good").unwrap();
        assert!((x - 0.52).abs() < 1e-5);
    }

    #[test]
    fn test_threshold_line_and_limits() {
        let fig = GreedyPlot::new(&data(4)).threshold(0.3).build().unwrap();
        let vline = fig.marks().iter().find_map(|m| match m {
            Mark::VLine { x, stroke } => Some((*x, stroke.color)),
            _ => None,
        });
        assert_eq!(vline, Some((0.3, Rgba::THRESHOLD)));
        assert_eq!(fig.axes().xlim, (-0.05, 1.0));
        assert_eq!(fig.axes().ylim, (-0.2, 4.2));
        assert!(!fig.axes().show_y_axis);
    }

    #[test]
    fn test_many_steps_cycle_shapes_and_colours() {
        let fig = GreedyPlot::new(&data(12)).build().unwrap();
        let styles: Vec<MarkerStyle> = fig
            .marks()
            .iter()
            .filter_map(|m| match m {
                Mark::Marker { style, .. } => Some(*style),
                _ => None,
            })
            .collect();
        assert_eq!(styles.len(), 13);
        assert_eq!(styles[9].shape, styles[1].shape);
        assert_eq!(styles[10].color, styles[1].color);
        assert_ne!(styles[10].color, GREEDY_PALETTE[0]);
    }
}
