//! Chart builders.
//!
//! Each builder takes chart data by reference and produces a [`Figure`]:
//!
//! ```
//! use counterplots::plots::GreedyPlot;
//! use counterplots::report::{ClassNames, GreedyData, GreedyStep};
//!
//! let data = GreedyData {
//!     factual_score: 0.2,
//!     steps: vec![GreedyStep {
//!         name: "income".into(),
//!         factual: "1.0".into(),
//!         counterfactual: "3.0".into(),
//!         score: 0.7,
//!     }],
//!     class_names: ClassNames::new("Denied", "Approved"),
//! };
//! let figure = GreedyPlot::new(&data).threshold(0.5).build().unwrap();
//! assert!(figure.to_svg().unwrap().render().contains("Approved"));
//! ```

mod constellation;
mod countershapley;
mod greedy;

pub use constellation::ConstellationPlot;
pub use countershapley::{beaked_bar, CounterShapleyPlot};
pub use greedy::GreedyPlot;

use crate::color::Rgba;
use crate::error::Result;
use crate::figure::{Figure, TextStyle, DEFAULT_DPI};
use crate::report::{ChartData, ClassNames};

/// Settings shared by every chart builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Decision threshold on the score axis.
    pub threshold: f64,
    /// Output resolution.
    pub dpi: f32,
    /// Decimals of printed scores.
    pub score_decimals: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            dpi: DEFAULT_DPI,
            score_decimals: 2,
        }
    }
}

impl ChartData {
    /// Build the figure matching this data's kind.
    pub fn to_figure(&self, options: &RenderOptions) -> Result<Figure> {
        match self {
            Self::Greedy(data) => GreedyPlot::new(data)
                .threshold(options.threshold)
                .dpi(options.dpi)
                .build(),
            Self::CounterShapley(data) => CounterShapleyPlot::new(data)
                .threshold(options.threshold)
                .dpi(options.dpi)
                .score_decimals(options.score_decimals)
                .build(),
            Self::Constellation(data) => ConstellationPlot::new(data)
                .threshold(options.threshold)
                .dpi(options.dpi)
                .build(),
        }
    }
}

/// Horizontal positions of the three parts of a class header.
struct HeaderLayout {
    factual: f32,
    arrow: f32,
    counterfactual: f32,
    y: f32,
    size_pt: f32,
}

/// `factual ➜ counterfactual` in bold, coloured by class.
fn class_header(fig: &mut Figure, names: &ClassNames, layout: &HeaderLayout) {
    let style = |color| TextStyle::new(color).size(layout.size_pt).bold();
    fig.text(layout.factual, layout.y, names.factual.as_str(), style(Rgba::FACTUAL));
    fig.text(layout.arrow, layout.y, "➜", style(Rgba::THRESHOLD));
    fig.text(
        layout.counterfactual,
        layout.y,
        names.counterfactual.as_str(),
        style(Rgba::COUNTERFACTUAL),
    );
}

fn char_len(text: &str) -> f32 {
    text.chars().count() as f32
}
