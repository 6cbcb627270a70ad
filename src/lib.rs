//! # Counterplots
//!
//! Visual explanations of binary classifier decisions through
//! counterfactuals: given a factual input, a counterfactual that the model
//! classifies differently, and the model itself, draw how the score moves
//! from one to the other.
//!
//! ## Charts
//!
//! - **Greedy**: the changes applied one at a time, best first, as a ranked
//!   dot plot along the score axis
//! - **Counter-Shapley**: each change's exact Shapley share of the score
//!   shift as a stacked bar split at the decision threshold
//! - **Constellation**: every single change and every partial combination of
//!   changes as a scatter linked to the full counterfactual
//!
//! ## Quick Start
//!
//! ```rust
//! use counterplots::prelude::*;
//!
//! let model = |x: &[f64]| (0.2 * x[0] + 0.5 * x[1]).min(1.0);
//! let plot = CounterPlot::new(vec![1.0, 0.0], vec![1.5, 1.0], &model)
//!     .feature_names(["tenure", "income"])
//!     .class_names("Denied", "Approved")
//!     .build()?;
//!
//! let figure = CounterShapleyPlot::new(&plot.countershapley())
//!     .threshold(plot.threshold())
//!     .build()?;
//! let svg = figure.to_svg()?.render();
//! assert!(svg.contains("Approved"));
//! # Ok::<(), counterplots::Error>(())
//! ```
//!
//! SVG output carries every annotation; PNG output is a raster preview of
//! the chart geometry.
//!
//! ## Feature Flags
//!
//! - `cli`: the `counterplots` binary (JSON chart data in, SVG/PNG out)
//!
//! ## References
//!
//! - Shapley, L. S. (1953). "A value for n-person games."
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics/visualization code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color types and chart palettes.
pub mod color;

/// Core framebuffer for pixel rendering.
pub mod framebuffer;

/// Geometric primitives (points, lines, rectangles).
pub mod geometry;

/// Scale functions and axis ticks.
pub mod scale;

/// Scatter marker shapes.
pub mod marker;

// ============================================================================
// Explanation Modules
// ============================================================================

pub mod explain;

pub mod report;

pub mod adapters;

// ============================================================================
// Chart Modules
// ============================================================================

pub mod figure;

/// Greedy, counter-shapley and constellation chart builders.
pub mod plots;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Rendering backends and rasterization.
pub mod render;

/// Output encoders (SVG, PNG).
pub mod output;

/// YAML configuration.
pub mod config;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for counterplots operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use counterplots::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapters::{
        AttributionSource, CounterShapleyAttribution, FeatureAttribution, VectorAttribution,
        WeightListAttribution,
    };
    pub use crate::color::Rgba;
    pub use crate::config::{Config, OutputFormat};
    pub use crate::error::{Error, Result};
    pub use crate::explain::{CounterPlot, CounterfactualGenerator, Model};
    pub use crate::figure::Figure;
    pub use crate::plots::{ConstellationPlot, CounterShapleyPlot, GreedyPlot, RenderOptions};
    pub use crate::report::{ChartData, ConstellationData, CounterShapleyData, GreedyData};
}
