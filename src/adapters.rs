//! Feature attribution in a common shape.
//!
//! Different explainers report importance differently: a counter-shapley run
//! gives values for the changed features only, SHAP-like explainers return a
//! positional vector, LIME-like explainers a list of `(index, weight)` pairs.
//! The adapters here turn each into a [`FeatureAttribution`] keyed by feature
//! index so the results can be compared side by side.

use crate::error::{Error, Result};
use crate::explain::{CounterPlot, CounterfactualGenerator, Model};
use crate::report::ClassNames;
use std::collections::BTreeMap;
use tracing::debug;

/// Feature index to attribution.
pub type FeatureAttribution = BTreeMap<usize, f64>;

/// Anything that can attribute a prediction to input features.
pub trait AttributionSource {
    /// Attribution for the prediction on `factual`.
    fn attribute(&self, factual: &[f64]) -> Result<FeatureAttribution>;
}

/// Counter-shapley values of a generated counterfactual.
///
/// Features the counterfactual leaves unchanged are absent from the result.
#[derive(Debug)]
pub struct CounterShapleyAttribution<'a, G: ?Sized, M: ?Sized> {
    generator: &'a G,
    model: &'a M,
    feature_names: Vec<String>,
    class_names: ClassNames,
    threshold: f64,
}

impl<'a, G, M> CounterShapleyAttribution<'a, G, M>
where
    G: CounterfactualGenerator + ?Sized,
    M: Model + ?Sized,
{
    /// Adapter over `generator` and `model` for features named `feature_names`.
    pub fn new<I, S>(generator: &'a G, model: &'a M, feature_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            generator,
            model,
            feature_names: feature_names.into_iter().map(Into::into).collect(),
            class_names: ClassNames::default(),
            threshold: crate::explain::DEFAULT_THRESHOLD,
        }
    }

    /// Class names passed to the explanation.
    #[must_use]
    pub fn class_names(mut self, negative: impl Into<String>, positive: impl Into<String>) -> Self {
        self.class_names = ClassNames::new(negative, positive);
        self
    }

    /// Decision threshold passed to the explanation.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Run the explanation itself, for callers that also want the charts.
    pub fn explain(&self, factual: &[f64]) -> Result<CounterPlot<'a, M>> {
        let counterfactual = self.generator.generate(factual);
        CounterPlot::new(factual.to_vec(), counterfactual, self.model)
            .feature_names(self.feature_names.iter().cloned())
            .class_names(self.class_names.factual.clone(), self.class_names.counterfactual.clone())
            .threshold(self.threshold)
            .build()
    }
}

impl<G, M> AttributionSource for CounterShapleyAttribution<'_, G, M>
where
    G: CounterfactualGenerator + ?Sized,
    M: Model + ?Sized,
{
    fn attribute(&self, factual: &[f64]) -> Result<FeatureAttribution> {
        let plot = self.explain(factual)?;
        let attribution: FeatureAttribution = plot.countershapley_values_by_index().into_iter().collect();
        debug!(features = attribution.len(), "counter-shapley attribution");
        Ok(attribution)
    }
}

/// Positional attribution vector, one value per feature.
#[derive(Debug)]
pub struct VectorAttribution<F> {
    explainer: F,
}

impl<F> VectorAttribution<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    /// Adapter over an explainer returning one value per feature.
    pub fn new(explainer: F) -> Self {
        Self { explainer }
    }
}

impl<F> AttributionSource for VectorAttribution<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn attribute(&self, factual: &[f64]) -> Result<FeatureAttribution> {
        let values = (self.explainer)(factual);
        if values.len() != factual.len() {
            return Err(Error::DataLengthMismatch {
                what: "attribution vector",
                expected: factual.len(),
                actual: values.len(),
            });
        }
        Ok(values.into_iter().enumerate().collect())
    }
}

/// `(feature index, weight)` pairs that must cover every feature.
#[derive(Debug)]
pub struct WeightListAttribution<F> {
    explainer: F,
}

impl<F> WeightListAttribution<F>
where
    F: Fn(&[f64]) -> Vec<(usize, f64)>,
{
    /// Adapter over an explainer returning weighted feature indices.
    pub fn new(explainer: F) -> Self {
        Self { explainer }
    }
}

impl<F> AttributionSource for WeightListAttribution<F>
where
    F: Fn(&[f64]) -> Vec<(usize, f64)>,
{
    fn attribute(&self, factual: &[f64]) -> Result<FeatureAttribution> {
        let weights: BTreeMap<usize, f64> = (self.explainer)(factual).into_iter().collect();
        (0..factual.len())
            .map(|i| {
                weights
                    .get(&i)
                    .map(|w| (i, *w))
                    .ok_or(Error::MissingAttribution(i))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(x: &[f64]) -> f64 {
        0.1 * x[0] + 0.3 * x[1] + 0.2 * x[2]
    }

    #[test]
    fn test_countershapley_attribution_by_index() {
        // leaves feature 1 alone
        let generator = |x: &[f64]| vec![x[0] + 1.0, x[1], x[2] + 3.0];
        let source = CounterShapleyAttribution::new(&generator, &model, ["a", "b", "c"]);

        let attribution = source.attribute(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(attribution.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_relative_eq!(attribution[&0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(attribution[&2], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_countershapley_attribution_duplicate_names() {
        let generator = |x: &[f64]| x.iter().map(|v| v + 1.0).collect::<Vec<f64>>();
        let source = CounterShapleyAttribution::new(&generator, &model, ["f", "f", "g"]);

        let attribution = source.attribute(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(attribution.len(), 3);
        assert_relative_eq!(attribution[&0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(attribution[&1], 0.3, epsilon = 1e-12);
        assert_relative_eq!(attribution[&2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_countershapley_attribution_propagates_errors() {
        let generator = |x: &[f64]| x.to_vec();
        let source = CounterShapleyAttribution::new(&generator, &model, ["a", "b", "c"]);
        assert!(matches!(
            source.attribute(&[0.0, 0.0, 0.0]),
            Err(Error::NoFeatureChanges)
        ));
    }

    #[test]
    fn test_vector_attribution() {
        let source = VectorAttribution::new(|x: &[f64]| x.iter().map(|v| v * 2.0).collect());
        let attribution = source.attribute(&[1.0, -1.0]).unwrap();
        assert_eq!(attribution, FeatureAttribution::from([(0, 2.0), (1, -2.0)]));

        let short = VectorAttribution::new(|_: &[f64]| vec![1.0]);
        assert!(short.attribute(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_weight_list_attribution() {
        let source = WeightListAttribution::new(|_: &[f64]| vec![(1, 0.5), (0, -0.25)]);
        let attribution = source.attribute(&[3.0, 4.0]).unwrap();
        assert_eq!(attribution, FeatureAttribution::from([(0, -0.25), (1, 0.5)]));
    }

    #[test]
    fn test_weight_list_missing_index() {
        let source = WeightListAttribution::new(|_: &[f64]| vec![(0, 0.5), (2, 0.1)]);
        assert!(matches!(
            source.attribute(&[1.0, 2.0, 3.0]),
            Err(Error::MissingAttribution(1))
        ));
    }
}
