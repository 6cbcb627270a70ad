//! From a factual, a counterfactual and a model to chart data.
//!
//! [`CounterPlot`] evaluates the model on every mix of factual and
//! counterfactual values over the changed features, once, and derives the
//! three chart inputs from that table:
//!
//! - **greedy**: apply the change that raises the score most, repeat
//! - **counter-shapley**: exact Shapley values of the changes
//! - **constellation**: single changes and their proper combinations
//!
//! Scores are oriented so the counterfactual class is always on the right:
//! when the factual is in the positive class every score `s` is reported as
//! `1 - s` and the class names are swapped.
//!
//! # Example
//!
//! ```
//! use counterplots::explain::CounterPlot;
//!
//! let model = |x: &[f64]| (x[0] + x[1]) / 4.0;
//! let plot = CounterPlot::new(vec![0.0, 1.0], vec![1.0, 2.0], &model)
//!     .feature_names(["age", "income"])
//!     .build()
//!     .unwrap();
//!
//! let greedy = plot.greedy();
//! assert_eq!(greedy.steps.len(), 2);
//! ```

mod model;

pub use model::{CounterfactualGenerator, Model};

use crate::error::{Error, Result};
use crate::plots::{ConstellationPlot, CounterShapleyPlot, GreedyPlot};
use crate::report::{
    format_value, ClassNames, Combination, ConstellationData, CounterShapleyData,
    CounterShapleyFeature, GreedyData, GreedyStep, SinglePoint,
};
use std::cell::OnceCell;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Largest number of changed features whose subsets are enumerated.
pub const MAX_SUBSET_FEATURES: usize = 16;

/// Default decision threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Builder for [`CounterPlot`].
#[derive(Debug, Clone)]
pub struct CounterPlotBuilder<'m, M: Model + ?Sized> {
    factual: Vec<f64>,
    counterfactual: Vec<f64>,
    model: &'m M,
    feature_names: Option<Vec<String>>,
    class_names: ClassNames,
    threshold: f64,
}

impl<'m, M: Model + ?Sized> CounterPlotBuilder<'m, M> {
    /// Feature names (default `x0, x1, ...`).
    #[must_use]
    pub fn feature_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Names of the negative and positive class (default `"0"`, `"1"`).
    #[must_use]
    pub fn class_names(mut self, negative: impl Into<String>, positive: impl Into<String>) -> Self {
        self.class_names = ClassNames::new(negative, positive);
        self
    }

    /// Decision threshold on the model score (default 0.5).
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Validate the inputs and score both endpoints.
    pub fn build(self) -> Result<CounterPlot<'m, M>> {
        if self.factual.is_empty() || self.counterfactual.is_empty() {
            return Err(Error::EmptyData);
        }
        if self.factual.len() != self.counterfactual.len() {
            return Err(Error::DataLengthMismatch {
                what: "counterfactual",
                expected: self.factual.len(),
                actual: self.counterfactual.len(),
            });
        }
        let feature_names = match self.feature_names {
            Some(names) if names.len() != self.factual.len() => {
                return Err(Error::DataLengthMismatch {
                    what: "feature names",
                    expected: self.factual.len(),
                    actual: names.len(),
                });
            }
            Some(names) => names,
            None => (0..self.factual.len()).map(|i| format!("x{i}")).collect(),
        };

        #[allow(clippy::float_cmp)]
        let changed: Vec<usize> = (0..self.factual.len())
            .filter(|&i| self.factual[i] != self.counterfactual[i])
            .collect();
        if changed.is_empty() {
            return Err(Error::NoFeatureChanges);
        }
        if changed.len() > MAX_SUBSET_FEATURES {
            return Err(Error::TooManyFeatures {
                count: changed.len(),
                max: MAX_SUBSET_FEATURES,
            });
        }

        let factual_raw = self.model.predict(&self.factual);
        let counterfactual_raw = self.model.predict(&self.counterfactual);
        let positive = |s: f64| s > self.threshold;
        if positive(factual_raw) == positive(counterfactual_raw) {
            return Err(Error::NotCounterfactual {
                factual: factual_raw,
                counterfactual: counterfactual_raw,
                threshold: self.threshold,
            });
        }

        let flipped = positive(factual_raw);
        let class_names = if flipped {
            self.class_names.swapped()
        } else {
            self.class_names
        };
        debug!(
            changed = changed.len(),
            factual_raw, counterfactual_raw, flipped, "counterfactual validated"
        );

        Ok(CounterPlot {
            factual: self.factual,
            counterfactual: self.counterfactual,
            model: self.model,
            feature_names,
            class_names,
            threshold: self.threshold,
            flipped,
            changed,
            subset_scores: OnceCell::new(),
        })
    }
}

/// A validated counterfactual explanation.
pub struct CounterPlot<'m, M: Model + ?Sized> {
    factual: Vec<f64>,
    counterfactual: Vec<f64>,
    model: &'m M,
    feature_names: Vec<String>,
    class_names: ClassNames,
    threshold: f64,
    flipped: bool,
    changed: Vec<usize>,
    /// Oriented score per subset of `changed`, indexed by bitmask.
    subset_scores: OnceCell<Vec<f64>>,
}

impl<M: Model + ?Sized> fmt::Debug for CounterPlot<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterPlot")
            .field("factual", &self.factual)
            .field("counterfactual", &self.counterfactual)
            .field("feature_names", &self.feature_names)
            .field("class_names", &self.class_names)
            .field("threshold", &self.threshold)
            .field("flipped", &self.flipped)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

impl<'m, M: Model + ?Sized> CounterPlot<'m, M> {
    /// Start building an explanation of `factual` by `counterfactual`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(factual: Vec<f64>, counterfactual: Vec<f64>, model: &'m M) -> CounterPlotBuilder<'m, M> {
        CounterPlotBuilder {
            factual,
            counterfactual,
            model,
            feature_names: None,
            class_names: ClassNames::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    fn orient(&self, score: f64) -> f64 {
        if self.flipped {
            1.0 - score
        } else {
            score
        }
    }

    /// Threshold on the oriented score axis.
    pub fn threshold(&self) -> f64 {
        self.orient(self.threshold)
    }

    /// Class names in reading order.
    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    /// Feature names, one per input column.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Indices of the features the counterfactual changes, ascending.
    pub fn changed_features(&self) -> &[usize] {
        &self.changed
    }

    /// Oriented score of the factual.
    pub fn factual_score(&self) -> f64 {
        self.scores()[0]
    }

    /// Oriented score of the counterfactual.
    pub fn counterfactual_score(&self) -> f64 {
        self.scores()[self.full_mask()]
    }

    fn full_mask(&self) -> usize {
        (1 << self.changed.len()) - 1
    }

    /// Score table over all subsets of the changed features.
    fn scores(&self) -> &[f64] {
        self.subset_scores.get_or_init(|| {
            let subsets = 1usize << self.changed.len();
            debug!(subsets, "evaluating model on feature subsets");
            let mut x = self.factual.clone();
            (0..subsets)
                .map(|mask| {
                    for (bit, &feature) in self.changed.iter().enumerate() {
                        x[feature] = if mask & (1 << bit) == 0 {
                            self.factual[feature]
                        } else {
                            self.counterfactual[feature]
                        };
                    }
                    self.orient(self.model.predict(&x))
                })
                .collect()
        })
    }

    fn name(&self, bit: usize) -> &str {
        &self.feature_names[self.changed[bit]]
    }

    fn values(&self, bit: usize) -> (String, String) {
        let feature = self.changed[bit];
        (
            format_value(self.factual[feature]),
            format_value(self.counterfactual[feature]),
        )
    }

    /// Apply the best remaining change until all are applied.
    ///
    /// At each step the change whose addition gives the highest score wins;
    /// ties go to the lower feature index.
    pub fn greedy(&self) -> GreedyData {
        let scores = self.scores();
        let n = self.changed.len();
        let mut mask = 0usize;
        let mut steps = Vec::with_capacity(n);

        for _ in 0..n {
            let mut best: Option<(usize, f64)> = None;
            for bit in (0..n).filter(|&b| mask & (1 << b) == 0) {
                let score = scores[mask | (1 << bit)];
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((bit, score));
                }
            }
            let Some((bit, score)) = best else { break };
            mask |= 1 << bit;
            let (factual, counterfactual) = self.values(bit);
            steps.push(GreedyStep {
                name: self.name(bit).to_string(),
                factual,
                counterfactual,
                score,
            });
        }

        GreedyData {
            factual_score: self.factual_score(),
            steps,
            class_names: self.class_names.clone(),
        }
    }

    /// Exact Shapley value of each changed feature, in `changed` order.
    fn shapley(&self) -> Vec<f64> {
        let scores = self.scores();
        let n = self.changed.len();

        // weight of a coalition of size k: k! (n-k-1)! / n! = 1 / (n * C(n-1, k))
        let mut weights = Vec::with_capacity(n);
        let mut binom = 1.0_f64;
        for k in 0..n {
            weights.push(1.0 / (n as f64 * binom));
            binom = binom * (n - 1 - k) as f64 / (k + 1) as f64;
        }

        (0..n)
            .map(|bit| {
                let with = 1 << bit;
                (0..scores.len())
                    .filter(|&mask| mask & with == 0)
                    .map(|mask| weights[mask.count_ones() as usize] * (scores[mask | with] - scores[mask]))
                    .sum()
            })
            .collect()
    }

    /// Changed features by descending Shapley value, ties in feature order.
    fn shapley_order(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.shapley().into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Names and raw Shapley values, largest first.
    pub fn countershapley_values(&self) -> Vec<(String, f64)> {
        self.shapley_order()
            .into_iter()
            .map(|(bit, value)| (self.name(bit).to_string(), value))
            .collect()
    }

    /// Feature indices and raw Shapley values, largest first.
    pub fn countershapley_values_by_index(&self) -> Vec<(usize, f64)> {
        self.shapley_order()
            .into_iter()
            .map(|(bit, value)| (self.changed[bit], value))
            .collect()
    }

    /// Counter-shapley chart input.
    ///
    /// Each feature's `x` is its share of the total shift in percent; the
    /// cumulative score of the last feature equals the counterfactual score.
    pub fn countershapley(&self) -> CounterShapleyData {
        let factual_score = self.factual_score();
        let shift = self.counterfactual_score() - factual_score;
        let mut cumulative = factual_score;

        let features = self
            .shapley_order()
            .into_iter()
            .map(|(bit, value)| {
                cumulative += value;
                let (factual, counterfactual) = self.values(bit);
                CounterShapleyFeature {
                    name: self.name(bit).to_string(),
                    factual,
                    counterfactual,
                    x: value / shift * 100.0,
                    score: cumulative,
                }
            })
            .collect();

        CounterShapleyData {
            factual_score,
            features,
            class_names: self.class_names.clone(),
        }
    }

    /// Constellation chart input.
    pub fn constellation(&self) -> ConstellationData {
        let scores = self.scores();
        let n = self.changed.len();

        let single_points = (0..n)
            .map(|bit| {
                let (factual, counterfactual) = self.values(bit);
                SinglePoint {
                    label: format!("{} ({factual}➜{counterfactual})", self.name(bit)),
                    score: scores[1 << bit],
                }
            })
            .collect();

        let mut combinations = Vec::new();
        for size in 2..n {
            for mask in (0..scores.len()).filter(|m| m.count_ones() as usize == size) {
                combinations.push(Combination {
                    members: (0..n).filter(|&b| mask & (1 << b) != 0).collect(),
                    score: scores[mask],
                });
            }
        }

        ConstellationData {
            factual_score: self.factual_score(),
            single_points,
            combinations,
            counterfactual_score: self.counterfactual_score(),
            class_names: self.class_names.clone(),
        }
    }

    /// Render the greedy chart to `path` (`.svg` or `.png`).
    pub fn plot_greedy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        GreedyPlot::new(&self.greedy())
            .threshold(self.threshold())
            .build()?
            .save(path)
    }

    /// Render the counter-shapley chart to `path` (`.svg` or `.png`).
    pub fn plot_countershapley<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        CounterShapleyPlot::new(&self.countershapley())
            .threshold(self.threshold())
            .build()?
            .save(path)
    }

    /// Render the constellation chart to `path` (`.svg` or `.png`).
    pub fn plot_constellation<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ConstellationPlot::new(&self.constellation())
            .threshold(self.threshold())
            .build()?
            .save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Additive model: each feature adds its value times a weight.
    fn additive(x: &[f64]) -> f64 {
        0.1 * x[0] + 0.3 * x[1] + 0.2 * x[2]
    }

    /// Model with an interaction between the first two features.
    fn interacting(x: &[f64]) -> f64 {
        0.1 + 0.2 * x[0] + 0.1 * x[1] + 0.3 * x[0] * x[1] + 0.05 * x[2]
    }

    #[test]
    fn test_build_validation() {
        let model = additive;
        assert!(matches!(
            CounterPlot::new(vec![], vec![], &model).build(),
            Err(Error::EmptyData)
        ));
        assert!(matches!(
            CounterPlot::new(vec![0.0, 0.0, 0.0], vec![1.0, 1.0], &model).build(),
            Err(Error::DataLengthMismatch { .. })
        ));
        assert!(matches!(
            CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
                .feature_names(["a", "b"])
                .build(),
            Err(Error::DataLengthMismatch { what: "feature names", .. })
        ));
        assert!(matches!(
            CounterPlot::new(vec![1.0; 3], vec![1.0; 3], &model).build(),
            Err(Error::NoFeatureChanges)
        ));
        // 0.0 -> 0.1 stays below 0.5
        assert!(matches!(
            CounterPlot::new(vec![0.0; 3], vec![1.0, 0.0, 0.0], &model).build(),
            Err(Error::NotCounterfactual { .. })
        ));
    }

    #[test]
    fn test_too_many_features() {
        let model = |x: &[f64]| x.iter().sum::<f64>() / x.len() as f64;
        let n = MAX_SUBSET_FEATURES + 1;
        let err = CounterPlot::new(vec![0.0; n], vec![1.0; n], &model)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::TooManyFeatures { count: 17, max: 16 }));
    }

    #[test]
    fn test_default_names() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .build()
            .unwrap();
        assert_eq!(plot.feature_names(), ["x0", "x1", "x2"]);
        assert_eq!(plot.class_names(), &ClassNames::new("0", "1"));
        assert_eq!(plot.changed_features(), [0, 1, 2]);
    }

    #[test]
    fn test_scores_and_changed_features() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0, 1.0, 0.0], vec![1.0, 1.0, 2.0], &model)
            .build()
            .unwrap();
        assert_eq!(plot.changed_features(), [0, 2]);
        assert_relative_eq!(plot.factual_score(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(plot.counterfactual_score(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_for_positive_factual() {
        let model = additive;
        let plot = CounterPlot::new(vec![1.0; 3], vec![0.0; 3], &model)
            .class_names("Denied", "Approved")
            .build()
            .unwrap();
        // raw 0.6 -> 0.0, oriented 0.4 -> 1.0
        assert_relative_eq!(plot.factual_score(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(plot.counterfactual_score(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plot.threshold(), 0.5, epsilon = 1e-12);
        assert_eq!(plot.class_names().factual, "Approved");
        assert_eq!(plot.class_names().counterfactual, "Denied");
    }

    #[test]
    fn test_greedy_picks_largest_gain_first() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .feature_names(["a", "b", "c"])
            .build()
            .unwrap();
        let greedy = plot.greedy();

        let names: Vec<&str> = greedy.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
        assert_relative_eq!(greedy.steps[0].score, 0.3, epsilon = 1e-12);
        assert_relative_eq!(greedy.steps[2].score, plot.counterfactual_score(), epsilon = 1e-12);
        assert_eq!(greedy.steps[0].factual, "0.0");
        assert_eq!(greedy.steps[0].counterfactual, "1.0");
    }

    #[test]
    fn test_greedy_ties_go_to_lowest_index() {
        let model = |x: &[f64]| 0.3 * x[0] + 0.3 * x[1];
        let plot = CounterPlot::new(vec![0.0, 0.0], vec![1.0, 1.0], &model)
            .build()
            .unwrap();
        assert_eq!(plot.greedy().steps[0].name, "x0");
    }

    #[test]
    fn test_shapley_of_additive_model_is_its_terms() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .feature_names(["a", "b", "c"])
            .build()
            .unwrap();
        let values = plot.countershapley_values();
        assert_eq!(values[0].0, "b");
        assert_relative_eq!(values[0].1, 0.3, epsilon = 1e-12);
        assert_eq!(values[1].0, "c");
        assert_relative_eq!(values[1].1, 0.2, epsilon = 1e-12);
        assert_eq!(values[2].0, "a");
        assert_relative_eq!(values[2].1, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_shapley_values_keyed_by_feature_index() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0, 1.0, 0.0], vec![1.0, 1.0, 2.0], &model)
            .feature_names(["same", "other", "same"])
            .build()
            .unwrap();
        let values = plot.countershapley_values_by_index();
        assert_eq!(values.iter().map(|v| v.0).collect::<Vec<_>>(), [2, 0]);
        assert_relative_eq!(values[0].1, 0.4, epsilon = 1e-12);
        assert_relative_eq!(values[1].1, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_debug_with_closure_model() {
        let model = |x: &[f64]| 0.3 * x[0] + 0.3 * x[1];
        let plot = CounterPlot::new(vec![0.0, 0.0], vec![1.0, 1.0], &model)
            .build()
            .unwrap();
        let debug = format!("{plot:?}");
        assert!(debug.starts_with("CounterPlot"));
        assert!(debug.contains("changed: [0, 1]"));
    }

    #[test]
    fn test_shapley_splits_interaction_evenly() {
        let model = interacting;
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .build()
            .unwrap();
        let values: std::collections::HashMap<String, f64> =
            plot.countershapley_values().into_iter().collect();
        assert_relative_eq!(values["x0"], 0.2 + 0.15, epsilon = 1e-12);
        assert_relative_eq!(values["x1"], 0.1 + 0.15, epsilon = 1e-12);
        assert_relative_eq!(values["x2"], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_countershapley_is_efficient() {
        let model = interacting;
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .build()
            .unwrap();
        let data = plot.countershapley();

        let last = data.features.last().unwrap();
        assert_relative_eq!(last.score, plot.counterfactual_score(), epsilon = 1e-9);
        let total: f64 = data.features.iter().map(|f| f.x).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-9);
        assert!(data.features.windows(2).all(|w| w[0].x >= w[1].x));
    }

    #[test]
    fn test_constellation_subsets() {
        let model = |x: &[f64]| x.iter().sum::<f64>() / 4.0;
        let plot = CounterPlot::new(vec![0.0; 4], vec![1.0; 4], &model)
            .feature_names(["a", "b", "c", "d"])
            .build()
            .unwrap();
        let data = plot.constellation();

        assert_eq!(data.single_points.len(), 4);
        assert_eq!(data.single_points[0].label, "a (0.0➜1.0)");
        assert_relative_eq!(data.single_points[0].score, 0.25, epsilon = 1e-12);
        // C(4,2) + C(4,3)
        assert_eq!(data.combinations.len(), 10);
        assert!(data.combinations.iter().all(|c| (2..4).contains(&c.members.len())));
        assert_relative_eq!(data.counterfactual_score, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_change_has_no_combinations() {
        let model = additive;
        let plot = CounterPlot::new(vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 2.0], &model)
            .build()
            .unwrap();
        let data = plot.constellation();
        assert_eq!(data.single_points.len(), 1);
        assert!(data.combinations.is_empty());
    }

    #[test]
    fn test_model_called_once_per_subset() {
        use std::cell::Cell;
        let calls = Cell::new(0usize);
        let model = |x: &[f64]| {
            calls.set(calls.get() + 1);
            x.iter().sum::<f64>() / 3.0
        };
        let plot = CounterPlot::new(vec![0.0; 3], vec![1.0; 3], &model)
            .build()
            .unwrap();
        let after_build = calls.get();
        let _ = plot.greedy();
        let _ = plot.countershapley();
        let _ = plot.constellation();
        assert_eq!(calls.get() - after_build, 8);
    }
}
