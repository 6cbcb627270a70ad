//! Counter-shapley stacked bar.
//!
//! The x axis runs from the factual score (0) to the counterfactual score
//! (100). Each feature occupies a segment as wide as its share of the shift,
//! coloured by the side of the decision threshold it lies on. A segment that
//! straddles the threshold is split in two.

use super::{char_len, class_header, HeaderLayout};
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::figure::{text_width_px, Figure, PathCommand, Spines, TextStyle, DEFAULT_DPI};
use crate::report::{format_score, CounterShapleyData};
use tracing::debug;

const FONT_PT: f32 = 10.0;
const BAR_HEIGHT: f32 = 50.0;
const BEAK: f32 = 4.0;

/// Outline of one segment from `start` to `end`, optionally with a beak.
///
/// The top edge stops 4 units (4 % of the axis) short of `end`; with a beak
/// a quadratic curve through `(end, 50)` closes it down to `(end, 0)`.
#[must_use]
pub fn beaked_bar(start: f32, end: f32, beak: bool) -> Vec<PathCommand> {
    let mut path = vec![
        PathCommand::MoveTo(start, 0.0),
        PathCommand::LineTo(start, BAR_HEIGHT),
        PathCommand::LineTo(end - BEAK, BAR_HEIGHT),
    ];
    if beak {
        path.push(PathCommand::QuadTo {
            ctrl: (end, BAR_HEIGHT),
            to: (end, 0.0),
        });
    } else {
        path.push(PathCommand::LineTo(end, BAR_HEIGHT));
        path.push(PathCommand::LineTo(end, 0.0));
    }
    path.push(PathCommand::Close);
    path
}

/// Estimated width of `text` at the chart font size, in points.
fn text_width_pt(text: &str) -> f32 {
    text_width_px(text, FONT_PT)
}

/// Builder for the counter-shapley chart.
#[derive(Debug, Clone)]
pub struct CounterShapleyPlot<'a> {
    data: &'a CounterShapleyData,
    threshold: f64,
    dpi: f32,
    score_decimals: usize,
}

impl<'a> CounterShapleyPlot<'a> {
    /// Chart for `data`.
    #[must_use]
    pub fn new(data: &'a CounterShapleyData) -> Self {
        Self {
            data,
            threshold: 0.5,
            dpi: DEFAULT_DPI,
            score_decimals: 2,
        }
    }

    /// Decision threshold.
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

    /// Decimals of the printed scores.
    #[must_use]
    pub fn score_decimals(mut self, decimals: usize) -> Self {
        self.score_decimals = decimals;
        self
    }

    /// Position of the threshold on the 0..100 axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyData`] without features and
    /// [`Error::ScaleDomain`] when the scores do not move.
    pub fn threshold_x(&self) -> Result<f32> {
        let cf = self.data.counterfactual_score().ok_or(Error::EmptyData)?;
        let shift = cf - self.data.factual_score;
        if shift.abs() <= f64::EPSILON || !shift.is_finite() {
            return Err(Error::ScaleDomain(format!(
                "factual and counterfactual scores are both {cf}"
            )));
        }
        Ok(((self.threshold - self.data.factual_score) / shift * 100.0) as f32)
    }

    /// Lay out the chart.
    ///
    /// # Errors
    ///
    /// See [`CounterShapleyPlot::threshold_x`]; a feature width that does not
    /// fit the axis as a finite number is an [`Error::ScaleDomain`] as well.
    pub fn build(self) -> Result<Figure> {
        let x_t = self.threshold_x()?;
        let features = &self.data.features;
        if let Some(bad) = features.iter().find(|f| !(f.x as f32).is_finite()) {
            return Err(Error::ScaleDomain(format!("{} has width {}", bad.name, bad.x)));
        }
        let score = |s: f64| format_score(s, self.score_decimals);
        let plain = |color| TextStyle::new(color).size(FONT_PT);

        let mut fig = Figure::new(10.0, 1.5, self.dpi)?;

        fig.bar(0.0, 90.0, 0.5, Rgba::FACTUAL_SOLID);
        fig.text(-5.0, 140.0, "Factual Score", plain(Rgba::FACTUAL_SOLID));
        fig.text(
            0.0,
            100.0,
            score(self.data.factual_score),
            plain(Rgba::FACTUAL_SOLID).bold(),
        );

        let names = &self.data.class_names;
        class_header(
            &mut fig,
            names,
            &HeaderLayout {
                factual: x_t - (text_width_pt(&names.factual) * 0.2037 + 1.09),
                arrow: x_t - 1.0,
                counterfactual: x_t + 1.0,
                y: 170.0,
                size_pt: FONT_PT,
            },
        );

        fig.bar(0.0, -90.0, 200.0, Rgba::TRACK_GREY);

        let mut left = 0.0_f32;
        let mut starts = Vec::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            starts.push(left);
            let right = left + feature.x as f32;
            let mid = left + (right - left) / 2.0;

            fig.text(
                mid - char_len(&feature.name) * FONT_PT / 10.0 / 2.0,
                -30.0,
                feature.name.as_str(),
                plain(Rgba::LABEL_GREY),
            );

            if right < x_t {
                fig.path_patch(beaked_bar(left, right, true), Rgba::FACTUAL);
            } else if left < x_t {
                fig.path_patch(beaked_bar(left, x_t, false), Rgba::FACTUAL);
                fig.path_patch(beaked_bar(x_t, right, true), Rgba::COUNTERFACTUAL);
            } else {
                fig.path_patch(beaked_bar(left, right, true), Rgba::COUNTERFACTUAL);
            }

            let change = format!("{}➜{}", feature.factual, feature.counterfactual);
            fig.text(
                mid - text_width_pt(&change) * 0.1,
                -70.0,
                change,
                plain(Rgba::LABEL_GREY),
            );

            left = right;
            let color = if i + 1 == features.len() {
                Rgba::COUNTERFACTUAL_SOLID
            } else {
                Rgba::SCORE_GREY
            };
            fig.text(left, 100.0, score(feature.score), plain(color).bold());
        }

        fig.bar(left, 90.0, 0.5, Rgba::COUNTERFACTUAL_SOLID);
        fig.text(
            left - 10.0,
            140.0,
            "Counterfactual Score",
            plain(Rgba::COUNTERFACTUAL_SOLID),
        );

        fig.bar(x_t, 90.0, 0.25, Rgba::THRESHOLD);

        for start in &starts {
            fig.bar(*start, -90.0, 0.2, Rgba::SEPARATOR_GREY);
        }

        fig.set_xlim(0.0, 100.0);
        fig.set_ylim(-100.0, 170.0);
        fig.set_spines(Spines::none());
        fig.set_axis_visible(false, false);

        debug!(features = features.len(), threshold_x = x_t, end = left, "counter-shapley chart laid out");
        Ok(fig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Mark;
    use crate::report::{ClassNames, CounterShapleyFeature};

    fn feature(name: &str, x: f64, score: f64) -> CounterShapleyFeature {
        CounterShapleyFeature {
            name: name.into(),
            factual: "0.0".into(),
            counterfactual: "1.0".into(),
            x,
            score,
        }
    }

    /// Factual 0.25, counterfactual 0.75: the threshold sits at x = 50.
    fn data() -> CounterShapleyData {
        CounterShapleyData {
            factual_score: 0.25,
            features: vec![
                feature("a", 30.0, 0.4),
                feature("b", 40.0, 0.6),
                feature("c", 30.0, 0.75),
            ],
            class_names: ClassNames::new("No", "Yes"),
        }
    }

    fn patches(fig: &Figure) -> Vec<(Vec<PathCommand>, Rgba)> {
        fig.marks()
            .iter()
            .filter_map(|m| match m {
                Mark::Patch { path, fill } => Some((path.clone(), *fill)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_beaked_bar_shapes() {
        let beaked = beaked_bar(10.0, 40.0, true);
        assert_eq!(
            beaked,
            vec![
                PathCommand::MoveTo(10.0, 0.0),
                PathCommand::LineTo(10.0, 50.0),
                PathCommand::LineTo(36.0, 50.0),
                PathCommand::QuadTo {
                    ctrl: (40.0, 50.0),
                    to: (40.0, 0.0)
                },
                PathCommand::Close,
            ]
        );
        let flat = beaked_bar(10.0, 40.0, false);
        assert_eq!(flat[3], PathCommand::LineTo(40.0, 50.0));
        assert_eq!(flat[4], PathCommand::LineTo(40.0, 0.0));
    }

    #[test]
    fn test_threshold_x() {
        let data = data();
        let x_t = CounterShapleyPlot::new(&data).threshold_x().unwrap();
        assert!((x_t - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_errors() {
        let mut empty = data();
        empty.features.clear();
        assert!(matches!(CounterShapleyPlot::new(&empty).build(), Err(Error::EmptyData)));

        let mut flat = data();
        flat.features = vec![feature("a", 0.0, 0.25)];
        assert!(matches!(CounterShapleyPlot::new(&flat).build(), Err(Error::ScaleDomain(_))));
    }

    #[test]
    fn test_far_off_labels_keep_canvas_bounded() {
        let data = CounterShapleyData {
            factual_score: 0.499,
            features: vec![feature("a", 25_000.0, 25.499), feature("b", -24_900.0, 0.501)],
            class_names: ClassNames::default(),
        };
        let fig = CounterShapleyPlot::new(&data).build().unwrap();
        let (width, height) = fig.size_px();

        let bounds = fig.bounds().unwrap();
        assert!(bounds.width <= 3.0 * width as f32);
        assert!(bounds.height <= 3.0 * height as f32);
        let fb = fig.to_framebuffer().unwrap();
        assert!(fb.width() <= 3 * width + 100);
    }

    #[test]
    fn test_non_finite_width_is_rejected() {
        let mut data = data();
        data.features[0].x = 1e39;
        assert!(matches!(CounterShapleyPlot::new(&data).build(), Err(Error::ScaleDomain(_))));
    }

    #[test]
    fn test_segments_split_at_threshold() {
        let data = data();
        let fig = CounterShapleyPlot::new(&data).build().unwrap();
        let segments: Vec<_> = patches(&fig)
            .into_iter()
            .filter(|(_, fill)| *fill == Rgba::FACTUAL || *fill == Rgba::COUNTERFACTUAL)
            .collect();

        // a: factual; b: factual 30..50 flat + counterfactual 50..70; c: counterfactual
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].1, Rgba::FACTUAL);
        assert_eq!(segments[1], (beaked_bar(30.0, 50.0, false), Rgba::FACTUAL));
        assert_eq!(segments[2].1, Rgba::COUNTERFACTUAL);
        assert_eq!(segments[3], (beaked_bar(70.0, 100.0, true), Rgba::COUNTERFACTUAL));
    }

    #[test]
    fn test_score_labels() {
        let data = data();
        let fig = CounterShapleyPlot::new(&data).score_decimals(3).build().unwrap();
        let scores: Vec<(f32, String, Rgba)> = fig
            .marks()
            .iter()
            .filter_map(|m| match m {
                Mark::Text { x, y, text, style } if (*y - 100.0).abs() < 1e-6 => {
                    Some((*x, text.clone(), style.color))
                }
                _ => None,
            })
            .collect();
        assert_eq!(scores[0], (0.0, "0.250".to_string(), Rgba::FACTUAL_SOLID));
        assert_eq!(scores[1].1, "0.400");
        assert_eq!(scores[1].2, Rgba::SCORE_GREY);
        assert_eq!(scores[3], (100.0, "0.750".to_string(), Rgba::COUNTERFACTUAL_SOLID));
    }

    #[test]
    fn test_separators_and_ticks() {
        let data = data();
        let fig = CounterShapleyPlot::new(&data).build().unwrap();
        let separators = patches(&fig)
            .into_iter()
            .filter(|(_, fill)| *fill == Rgba::SEPARATOR_GREY)
            .count();
        assert_eq!(separators, 3);
        let threshold_bars = patches(&fig)
            .into_iter()
            .filter(|(_, fill)| *fill == Rgba::THRESHOLD)
            .count();
        assert_eq!(threshold_bars, 1);
        assert_eq!(fig.axes().spines, Spines::none());
        assert_eq!(fig.size_px(), (1000, 150));
    }

    #[test]
    fn test_negative_contribution_runs_backwards() {
        let data = CounterShapleyData {
            factual_score: 0.2,
            features: vec![feature("up", 120.0, 0.92), feature("down", -20.0, 0.8)],
            class_names: ClassNames::default(),
        };
        let fig = CounterShapleyPlot::new(&data).build().unwrap();
        let last = patches(&fig)
            .into_iter()
            .filter(|(_, fill)| *fill == Rgba::COUNTERFACTUAL)
            .last()
            .unwrap();
        assert_eq!(last.0, beaked_bar(120.0, 100.0, true));
    }
}
