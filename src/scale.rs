//! Scale functions for data-to-pixel mappings.
//!
//! Scales transform data values to visual positions. Axis ticks are picked
//! from the usual `{1, 2, 2.5, 5} × 10^k` ladder.

use crate::error::{Error, Result};

/// Trait for scale functions that map domain values to range values.
pub trait Scale<D, R> {
    /// Transform a domain value to a range value.
    fn scale(&self, value: D) -> R;

    /// Get the domain extent.
    fn domain(&self) -> (D, D);

    /// Get the range extent.
    fn range(&self) -> (R, R);
}

/// Linear scale for continuous-to-continuous mapping.
///
/// Values outside the domain extrapolate linearly, which is what annotation
/// placement relies on for labels left of the axis.
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    domain_min: f32,
    domain_max: f32,
    range_min: f32,
    range_max: f32,
}

impl LinearScale {
    /// Create a new linear scale.
    ///
    /// # Errors
    ///
    /// Returns an error if domain_min equals domain_max.
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Result<Self> {
        if (domain.0 - domain.1).abs() < f32::EPSILON || !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(Error::ScaleDomain(format!(
                "degenerate domain [{}, {}]",
                domain.0, domain.1
            )));
        }

        Ok(Self {
            domain_min: domain.0,
            domain_max: domain.1,
            range_min: range.0,
            range_max: range.1,
        })
    }

    /// Invert the scale (range to domain).
    #[must_use]
    pub fn invert(&self, value: f32) -> f32 {
        let t = (value - self.range_min) / (self.range_max - self.range_min);
        self.domain_min + t * (self.domain_max - self.domain_min)
    }

    /// Range units per domain unit (negative for inverted ranges).
    #[must_use]
    pub fn factor(&self) -> f32 {
        (self.range_max - self.range_min) / (self.domain_max - self.domain_min)
    }
}

impl Scale<f32, f32> for LinearScale {
    fn scale(&self, value: f32) -> f32 {
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_min + t * (self.range_max - self.range_min)
    }

    fn domain(&self) -> (f32, f32) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (f32, f32) {
        (self.range_min, self.range_max)
    }
}

/// Axis ticks for a data interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticks {
    /// Tick positions in data units, ascending.
    pub values: Vec<f32>,
    /// Distance between neighbouring ticks.
    pub step: f32,
    /// Decimals needed to tell labels apart.
    pub decimals: usize,
}

impl Ticks {
    /// Label for each tick, e.g. `0.0, 0.2, ... 1.0`.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| format!("{:.*}", self.decimals, v))
            .collect()
    }
}

/// Pick at most `max_ticks` evenly spaced ticks inside `[lo, hi]`.
///
/// # Errors
///
/// Returns [`Error::ScaleDomain`] for an empty or non-finite interval.
pub fn nice_ticks(lo: f32, hi: f32, max_ticks: usize) -> Result<Ticks> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 {
        return Err(Error::ScaleDomain(format!("cannot tick interval [{lo}, {hi}]")));
    }
    let max_ticks = max_ticks.max(1) as f32;

    let raw = span / max_ticks;
    let magnitude = 10f32.powf(raw.log10().floor());
    let mut multiplier = 10.0;
    for m in [1.0, 2.0, 2.5, 5.0, 10.0] {
        if span / (m * magnitude) <= max_ticks {
            multiplier = m;
            break;
        }
    }
    let step = multiplier * magnitude;

    let mut decimals = (-step.log10().floor()).max(0.0) as usize;
    if (multiplier - 2.5).abs() < f32::EPSILON {
        decimals += 1;
    }

    let tolerance = step * 1e-4;
    let first = (lo / step).ceil();
    let mut values = Vec::new();
    let mut k = 0.0;
    loop {
        let v = (first + k) * step;
        if v > hi + tolerance {
            break;
        }
        // snap -0.0 and float dust to exact zero
        values.push(if v.abs() < tolerance { 0.0 } else { v });
        k += 1.0;
    }

    Ok(Ticks {
        values,
        step,
        decimals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 500.0)).unwrap();
        assert_relative_eq!(scale.scale(0.0), 0.0);
        assert_relative_eq!(scale.scale(50.0), 250.0);
        assert_relative_eq!(scale.scale(100.0), 500.0);
        assert_relative_eq!(scale.factor(), 5.0);
    }

    #[test]
    fn test_linear_scale_inverted_range() {
        let scale = LinearScale::new((0.0, 1.0), (400.0, 100.0)).unwrap();
        assert_relative_eq!(scale.scale(0.0), 400.0);
        assert_relative_eq!(scale.scale(1.0), 100.0);
        assert_relative_eq!(scale.factor(), -300.0);
    }

    #[test]
    fn test_linear_scale_extrapolates() {
        let scale = LinearScale::new((0.0, 1.0), (100.0, 200.0)).unwrap();
        assert_relative_eq!(scale.scale(-0.5), 50.0);
    }

    #[test]
    fn test_linear_scale_invert() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 500.0)).unwrap();
        assert_relative_eq!(scale.invert(250.0), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_linear_scale_degenerate_domain() {
        assert!(LinearScale::new((1.0, 1.0), (0.0, 100.0)).is_err());
        assert!(LinearScale::new((0.0, f32::NAN), (0.0, 100.0)).is_err());
    }

    #[test]
    fn test_nice_ticks_unit_interval() {
        let ticks = nice_ticks(-0.05, 1.0, 8).unwrap();
        assert_eq!(ticks.values.len(), 6);
        assert_relative_eq!(ticks.step, 0.2, epsilon = 1e-6);
        assert_eq!(
            ticks.labels(),
            vec!["0.0", "0.2", "0.4", "0.6", "0.8", "1.0"]
        );
    }

    #[test]
    fn test_nice_ticks_quarter_steps() {
        let ticks = nice_ticks(0.0, 1.0, 4).unwrap();
        assert_relative_eq!(ticks.step, 0.25, epsilon = 1e-6);
        assert_eq!(ticks.decimals, 2);
        assert_eq!(ticks.labels().last().map(String::as_str), Some("1.00"));
    }

    #[test]
    fn test_nice_ticks_large_range() {
        let ticks = nice_ticks(0.0, 100.0, 5).unwrap();
        assert_relative_eq!(ticks.step, 20.0, epsilon = 1e-4);
        assert_eq!(ticks.decimals, 0);
        assert_eq!(ticks.labels()[1], "20");
    }

    #[test]
    fn test_nice_ticks_rejects_empty_interval() {
        assert!(nice_ticks(1.0, 1.0, 5).is_err());
        assert!(nice_ticks(1.0, 0.0, 5).is_err());
    }
}
