//! Error types for counterplots operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building explanations or rendering charts.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// JSON chart data could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid dimensions for framebuffer or figure.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Two sequences that must line up have different lengths.
    #[error("Data length mismatch: {what} has {actual} elements, expected {expected}")]
    DataLengthMismatch {
        /// Which sequence is off.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Empty data provided where non-empty is required.
    #[error("Empty data provided")]
    EmptyData,

    /// Factual and counterfactual are identical.
    #[error("Counterfactual does not change any feature")]
    NoFeatureChanges,

    /// The counterfactual lands in the same class as the factual.
    #[error(
        "Counterfactual score {counterfactual} does not cross threshold {threshold} (factual score {factual})"
    )]
    NotCounterfactual {
        /// Model score of the factual.
        factual: f64,
        /// Model score of the counterfactual.
        counterfactual: f64,
        /// Decision threshold.
        threshold: f64,
    },

    /// Too many changed features for exhaustive subset evaluation.
    #[error("{count} changed features exceed the supported maximum of {max}")]
    TooManyFeatures {
        /// Number of changed features.
        count: usize,
        /// Supported maximum.
        max: usize,
    },

    /// An attribution source did not report a weight for a feature.
    #[error("No attribution reported for feature index {0}")]
    MissingAttribution(usize),

    /// Scale domain error (e.g., equal domain bounds).
    #[error("Scale domain error: {0}")]
    ScaleDomain(String),

    /// Color parsing error.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Output path extension has no encoder.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions {
            width: 0,
            height: 100,
        };
        assert!(err.to_string().contains("Invalid dimensions"));
    }

    #[test]
    fn test_data_length_mismatch() {
        let err = Error::DataLengthMismatch {
            what: "counterfactual",
            expected: 10,
            actual: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("counterfactual"));
        assert!(msg.contains("10"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_not_counterfactual_mentions_scores() {
        let err = Error::NotCounterfactual {
            factual: 0.2,
            counterfactual: 0.4,
            threshold: 0.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.4"));
        assert!(msg.contains("0.5"));
    }

    #[test]
    fn test_config_parse_includes_line() {
        let err = Error::ConfigParse {
            line: 4,
            message: "bad value".to_string(),
        };
        assert!(err.to_string().contains("line 4"));
    }
}
