//! Chart input data.
//!
//! These are the precomputed explanations the chart builders consume. They
//! come out of [`crate::explain::CounterPlot`] or can be loaded from JSON,
//! which is how the `counterplots` binary is fed.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Display names of the two classes, in reading order (factual first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNames {
    /// Class of the factual.
    pub factual: String,
    /// Class of the counterfactual.
    pub counterfactual: String,
}

impl ClassNames {
    /// Create from the two names.
    pub fn new(factual: impl Into<String>, counterfactual: impl Into<String>) -> Self {
        Self {
            factual: factual.into(),
            counterfactual: counterfactual.into(),
        }
    }

    /// Same names in the opposite order.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self::new(self.counterfactual.clone(), self.factual.clone())
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::new("0", "1")
    }
}

/// One applied change of the greedy path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyStep {
    /// Feature name.
    pub name: String,
    /// Factual value, as displayed.
    pub factual: String,
    /// Counterfactual value, as displayed.
    pub counterfactual: String,
    /// Score after this change (and all before it) is applied.
    pub score: f64,
}

/// Input of the greedy chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyData {
    /// Score of the unmodified factual.
    pub factual_score: f64,
    /// Changes in the order they were applied.
    pub steps: Vec<GreedyStep>,
    /// Class names.
    #[serde(default)]
    pub class_names: ClassNames,
}

/// Contribution of one changed feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterShapleyFeature {
    /// Feature name.
    pub name: String,
    /// Factual value, as displayed.
    pub factual: String,
    /// Counterfactual value, as displayed.
    pub counterfactual: String,
    /// Share of the total score shift, in percent.
    pub x: f64,
    /// Cumulative score up to and including this feature.
    pub score: f64,
}

/// Input of the counter-shapley chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterShapleyData {
    /// Score of the unmodified factual.
    pub factual_score: f64,
    /// Features, largest contribution first.
    pub features: Vec<CounterShapleyFeature>,
    /// Class names.
    #[serde(default)]
    pub class_names: ClassNames,
}

impl CounterShapleyData {
    /// Cumulative score after the last feature.
    pub fn counterfactual_score(&self) -> Option<f64> {
        self.features.last().map(|f| f.score)
    }
}

/// Effect of changing a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePoint {
    /// `name (factual➜counterfactual)`.
    pub label: String,
    /// Score with only this feature changed.
    pub score: f64,
}

/// Effect of changing several features together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Positions of the member features in the single-point list.
    pub members: Vec<usize>,
    /// Score with all members changed.
    pub score: f64,
}

impl Combination {
    /// Mean member position, the row the combination is drawn on.
    pub fn row(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().sum::<usize>() as f64 / self.members.len() as f64
    }
}

/// Input of the constellation chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationData {
    /// Score of the unmodified factual.
    pub factual_score: f64,
    /// One entry per changed feature, in feature order.
    pub single_points: Vec<SinglePoint>,
    /// Proper subsets of two or more changes.
    #[serde(default)]
    pub combinations: Vec<Combination>,
    /// Score of the full counterfactual.
    pub counterfactual_score: f64,
    /// Class names.
    #[serde(default)]
    pub class_names: ClassNames,
}

/// Any chart input, tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    /// Greedy dot plot.
    Greedy(GreedyData),
    /// Counter-shapley stacked bar.
    CounterShapley(CounterShapleyData),
    /// Constellation scatter.
    Constellation(ConstellationData),
}

impl ChartData {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The `"kind"` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Greedy(_) => "greedy",
            Self::CounterShapley(_) => "countershapley",
            Self::Constellation(_) => "constellation",
        }
    }
}

/// Shortest representation of a feature value; whole numbers keep a `.0`.
pub fn format_value(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Score with a fixed number of decimals.
pub fn format_score(score: f64, decimals: usize) -> String {
    format!("{score:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1.0), "1.0");
        assert_eq!(format_value(-3.0), "-3.0");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.123_456, 2), "0.12");
        assert_eq!(format_score(0.5, 3), "0.500");
    }

    #[test]
    fn test_chart_data_kind_tag() {
        let json = r#"{
            "kind": "greedy",
            "factual_score": 0.2,
            "steps": [{"name": "age", "factual": "30.0", "counterfactual": "45.0", "score": 0.7}]
        }"#;
        let data = ChartData::from_json(json).unwrap();
        assert_eq!(data.kind(), "greedy");
        let ChartData::Greedy(greedy) = &data else {
            panic!("expected greedy data");
        };
        assert_eq!(greedy.class_names, ClassNames::default());
        assert_eq!(greedy.steps[0].name, "age");

        let back = ChartData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_countershapley_tag_is_lowercase() {
        let data = ChartData::CounterShapley(CounterShapleyData {
            factual_score: 0.1,
            features: Vec::new(),
            class_names: ClassNames::new("No", "Yes"),
        });
        assert!(data.to_json().unwrap().contains(r#""kind": "countershapley""#));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        assert!(ChartData::from_json(r#"{"kind": "pie"}"#).is_err());
    }

    #[test]
    fn test_combination_row() {
        let combo = Combination {
            members: vec![0, 1, 3],
            score: 0.4,
        };
        assert!((combo.row() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_names_swapped() {
        let names = ClassNames::new("Bad", "Good").swapped();
        assert_eq!(names.factual, "Good");
        assert_eq!(names.counterfactual, "Bad");
    }
}
