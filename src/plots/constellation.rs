//! Constellation scatter.
//!
//! Row `k` holds the score of changing only feature `k`. Small blue points
//! are combinations of changes, drawn at the mean row of their members and
//! linked back to each member. Every single point is also linked to the full
//! counterfactual.

use super::{char_len, class_header, HeaderLayout};
use crate::color::{palette_color, Rgba, CONSTELLATION_PALETTE};
use crate::error::{Error, Result};
use crate::figure::{Figure, LineStyle, MarkerStyle, Spines, Stroke, TextStyle, DEFAULT_DPI};
use crate::report::ConstellationData;
use tracing::debug;

/// Builder for the constellation chart.
#[derive(Debug, Clone)]
pub struct ConstellationPlot<'a> {
    data: &'a ConstellationData,
    threshold: f64,
    dpi: f32,
}

impl<'a> ConstellationPlot<'a> {
    /// Chart for `data`.
    #[must_use]
    pub fn new(data: &'a ConstellationData) -> Self {
        Self {
            data,
            threshold: 0.5,
            dpi: DEFAULT_DPI,
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

    /// Lay out the chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyData`] without single points and
    /// [`Error::DataLengthMismatch`] when a combination refers to a row that
    /// does not exist.
    pub fn build(self) -> Result<Figure> {
        let singles = &self.data.single_points;
        if singles.is_empty() {
            return Err(Error::EmptyData);
        }
        let n = singles.len();
        if let Some(bad) = self
            .data
            .combinations
            .iter()
            .flat_map(|c| c.members.iter())
            .find(|&&m| m >= n)
        {
            return Err(Error::DataLengthMismatch {
                what: "single points referenced by combinations",
                expected: n,
                actual: bad + 1,
            });
        }

        let rows = n as f32;
        let t = self.threshold as f32;
        let factual = self.data.factual_score as f32;
        let cf = self.data.counterfactual_score as f32;
        let cf_row = (rows - 1.0) / 2.0;

        let mut fig = Figure::new(10.0, 4.0, self.dpi)?;
        fig.set_xlim(0.0, 1.0);
        fig.set_ylim(-0.1, rows - 0.9);

        for (k, point) in singles.iter().enumerate() {
            let style = MarkerStyle::new(palette_color(&CONSTELLATION_PALETTE, k)).area(100.0);
            fig.scatter(point.score as f32, k as f32, style);
        }

        let longest = singles.iter().map(|p| char_len(&p.label)).fold(0.0, f32::max);
        for (k, point) in singles.iter().enumerate() {
            fig.text(
                -0.012 * longest,
                k as f32,
                point.label.as_str(),
                TextStyle::new(palette_color(&CONSTELLATION_PALETTE, k)).size(12.0),
            );
        }

        for combo in &self.data.combinations {
            fig.scatter(
                combo.score as f32,
                combo.row() as f32,
                MarkerStyle::new(Rgba::BLUE).area(10.0),
            );
        }

        fig.scatter(cf, cf_row, MarkerStyle::new(Rgba::COUNTERFACTUAL_POINT).area(100.0));

        let reference = |color| Stroke::new(color).style(LineStyle::Dashed).zorder(0.0);
        let label_y = rows * 1.01 - 0.9;
        fig.axvline(t, reference(Rgba::THRESHOLD));
        fig.axvline(factual, reference(Rgba::FACTUAL));
        fig.text(factual - 0.06, label_y, "Factual Score", TextStyle::new(Rgba::FACTUAL));
        fig.axvline(cf, reference(Rgba::COUNTERFACTUAL));
        fig.text(
            cf - 0.10,
            label_y,
            "Counterfactual Score",
            TextStyle::new(Rgba::COUNTERFACTUAL),
        );

        fig.set_spines(Spines::bottom_only());
        fig.set_axis_visible(true, false);

        let names = &self.data.class_names;
        class_header(
            &mut fig,
            names,
            &HeaderLayout {
                factual: t - 0.10 * char_len(&names.factual) / 8.0,
                arrow: t - 0.01,
                counterfactual: t + 0.01,
                y: label_y + 0.035 * rows,
                size_pt: 10.0,
            },
        );

        let to_counterfactual = Stroke::new(Rgba::BLACK)
            .width(1.0)
            .alpha(0.15)
            .style(LineStyle::Dotted)
            .zorder(0.0);
        for (k, point) in singles.iter().enumerate() {
            fig.plot(&[point.score as f32, cf], &[k as f32, cf_row], to_counterfactual)?;
        }

        let to_member = Stroke::new(Rgba::COMBINATION_GREY)
            .width(1.0)
            .alpha(0.5)
            .zorder(0.0);
        for combo in &self.data.combinations {
            let row = combo.row() as f32;
            for &m in &combo.members {
                fig.plot(
                    &[singles[m].score as f32, combo.score as f32],
                    &[m as f32, row],
                    to_member,
                )?;
            }
        }

        debug!(
            singles = n,
            combinations = self.data.combinations.len(),
            "constellation chart laid out"
        );
        Ok(fig)
    }
}
