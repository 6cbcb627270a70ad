//! Collaborators the explanation layer is generic over.

/// A binary classifier returning the score of the positive class.
pub trait Model {
    /// Score in `[0, 1]` for one feature vector.
    fn predict(&self, x: &[f64]) -> f64;
}

impl<F> Model for F
where
    F: Fn(&[f64]) -> f64,
{
    fn predict(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Produces a counterfactual for a given input.
pub trait CounterfactualGenerator {
    /// Counterfactual of `x`; must have the same length.
    fn generate(&self, x: &[f64]) -> Vec<f64>;
}

impl<F> CounterfactualGenerator for F
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn generate(&self, x: &[f64]) -> Vec<f64> {
        self(x)
    }
}
