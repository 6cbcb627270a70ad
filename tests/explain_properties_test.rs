//! Property tests for the explanation layer and the chart layouts it feeds.

use counterplots::figure::Mark;
use counterplots::prelude::*;
use proptest::prelude::*;

/// Model with additive terms plus one interaction between the first two features.
fn model_for(weights: Vec<f64>, interaction: f64) -> impl Fn(&[f64]) -> f64 {
    move |x: &[f64]| {
        let linear: f64 = weights.iter().zip(x).map(|(w, v)| w * v).sum();
        0.05 + linear + interaction * x[0] * x[1]
    }
}

fn weights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..0.3, 2..7)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn countershapley_is_efficient(weights in weights(), interaction in 0.0f64..0.2) {
        let n = weights.len();
        let model = model_for(weights, interaction);
        let factual = vec![0.0; n];
        let counterfactual = vec![1.0; n];
        let threshold = (model(&factual) + model(&counterfactual)) / 2.0;

        let plot = CounterPlot::new(factual, counterfactual, &model)
            .threshold(threshold)
            .build()
            .unwrap();
        let data = plot.countershapley();

        let last = data.features.last().unwrap();
        prop_assert!((last.score - plot.counterfactual_score()).abs() < 1e-9);
        let total: f64 = data.features.iter().map(|f| f.x).sum();
        prop_assert!((total - 100.0).abs() < 1e-6);
        prop_assert!(data.features.windows(2).all(|w| w[0].x >= w[1].x));
    }

    #[test]
    fn greedy_applies_every_change(weights in weights(), interaction in 0.0f64..0.2) {
        let n = weights.len();
        let model = model_for(weights, interaction);
        let factual = vec![0.0; n];
        let counterfactual = vec![1.0; n];
        let threshold = (model(&factual) + model(&counterfactual)) / 2.0;

        let plot = CounterPlot::new(factual, counterfactual, &model)
            .threshold(threshold)
            .build()
            .unwrap();
        let greedy = plot.greedy();

        prop_assert_eq!(greedy.steps.len(), n);
        let last = greedy.steps.last().unwrap();
        prop_assert!((last.score - plot.counterfactual_score()).abs() < 1e-12);
        // non-negative terms only ever raise the score
        prop_assert!(greedy.steps.windows(2).all(|w| w[0].score <= w[1].score + 1e-12));
    }

    #[test]
    fn constellation_covers_proper_subsets(weights in weights()) {
        let n = weights.len();
        let model = model_for(weights, 0.0);
        let factual = vec![0.0; n];
        let counterfactual = vec![1.0; n];
        let threshold = (model(&factual) + model(&counterfactual)) / 2.0;

        let plot = CounterPlot::new(factual, counterfactual, &model)
            .threshold(threshold)
            .build()
            .unwrap();
        let data = plot.constellation();

        prop_assert_eq!(data.single_points.len(), n);
        prop_assert_eq!(data.combinations.len(), (1usize << n) - n - 2);
        prop_assert!(data.combinations.iter().all(|c| c.members.len() >= 2 && c.members.len() < n));
    }

    #[test]
    fn countershapley_segments_tile_the_axis(weights in weights(), interaction in 0.0f64..0.2) {
        let n = weights.len();
        let model = model_for(weights, interaction);
        let factual = vec![0.0; n];
        let counterfactual = vec![1.0; n];
        let threshold = (model(&factual) + model(&counterfactual)) / 2.0;

        let plot = CounterPlot::new(factual, counterfactual, &model)
            .threshold(threshold)
            .build()
            .unwrap();
        let figure = CounterShapleyPlot::new(&plot.countershapley())
            .threshold(plot.threshold())
            .build()
            .unwrap();

        let segments = figure
            .marks()
            .iter()
            .filter(|m| matches!(m, Mark::Patch { fill, .. } if *fill == Rgba::FACTUAL || *fill == Rgba::COUNTERFACTUAL))
            .count();
        // one per feature, plus one where the threshold splits a feature
        prop_assert!(segments == n || segments == n + 1);
        prop_assert!(figure.to_svg().is_ok());
    }
}
