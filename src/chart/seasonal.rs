//! Seasonal envelope chart
//!
//! Renders the min/max band and the mean of past years as a shaded area with
//! a dashed (folded) or solid (unfolded) mean line. Both the cutoff and the
//! reference year default to the year of `ChartContext::today`.

use crate::chart::{
    assemble_metadata, primary_column, ChartContext, ChartDescriptor, ChartPayload, ChartType,
    RenderedChart,
};
use crate::error::ReshapeResult;
use crate::frame::{Aggregation, Frame, Frequency, Interpolation};
use crate::seasonal::{stats_folded, stats_unfolded, SeasonalStatDefinition};
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};

const MEAN_COLOR: &str = "#15607a";
const TRANSPARENT: &str = "#ffffff00";
const BAND_COLOR: &str = "#cccccc";

/// Univariate seasonal chart
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalChart {
    pub descriptor: ChartDescriptor,
    pub freq: Frequency,
    pub aggregation: Aggregation,
    pub interpolation: Option<Interpolation>,
    /// First year left out of the envelope
    pub cutoff_year: Option<i32>,
    /// Year the folded axis is drawn on
    pub reference_year: Option<i32>,
    /// Keep the real historical axis instead of folding
    pub unfold: bool,
    /// Window applied to the unfolded axis
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SeasonalChart {
    pub fn new(descriptor: ChartDescriptor) -> Self {
        Self {
            descriptor,
            freq: Frequency::Day,
            aggregation: Aggregation::Mean,
            interpolation: None,
            cutoff_year: None,
            reference_year: None,
            unfold: true,
            start: None,
            end: None,
        }
    }

    pub fn with_frequency(mut self, freq: Frequency, aggregation: Aggregation) -> Self {
        self.freq = freq;
        self.aggregation = aggregation;
        self
    }

    pub fn with_interpolation(mut self, method: Interpolation) -> Self {
        self.interpolation = Some(method);
        self
    }

    pub fn with_cutoff_year(mut self, year: i32) -> Self {
        self.cutoff_year = Some(year);
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn folded(mut self) -> Self {
        self.unfold = false;
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    fn envelope_block(&self, definition: &SeasonalStatDefinition) -> Value {
        let (min, max, mean) = (&definition.min.name, &definition.max.name, &definition.mean.name);
        let (dash, tick_format, tooltip_format) = if self.unfold {
            (0, "auto", "ll")
        } else {
            (3, "MMMM", "Do MMMM")
        };
        json!({
            "visualize": {
                "x-grid": "ticks",
                "y-grid": "on",
                "scale-y": "linear",
                "labeling": "right",
                "base-color": 7,
                "label-colors": true,
                "label-margin": 100,
                "line-dashes": { mean: dash },
                "line-widths": { min: 3, max: 3, mean: 3 },
                "custom-colors": {
                    mean: MEAN_COLOR,
                    max: TRANSPARENT,
                    min: TRANSPARENT,
                },
                "interpolation": "linear",
                "show-tooltips": true,
                "x-tick-format": tick_format,
                "y-grid-labels": "inside",
                "tooltip-use-custom-formats": true,
                "tooltip-x-format": tooltip_format,
                "y-grid-subdivide": true,
                "line-value-labels": true,
                "custom-area-fills": [{
                    "to": max,
                    "from": min,
                    "color": BAND_COLOR,
                    "opacity": 0.6,
                    "interpolation": "linear",
                }],
            }
        })
    }
}

impl ChartPayload for SeasonalChart {
    fn descriptor(&self) -> &ChartDescriptor {
        &self.descriptor
    }

    fn chart_type(&self) -> ChartType {
        ChartType::Lines
    }

    fn render(&self, frame: &Frame, ctx: &ChartContext) -> ReshapeResult<RenderedChart> {
        let cutoff_year = self.cutoff_year.unwrap_or_else(|| ctx.today.year());
        let (stats, definition) = if self.unfold {
            let (stats, definition) = stats_unfolded(
                frame,
                self.freq,
                self.aggregation,
                self.interpolation,
                cutoff_year,
            )?;
            (stats.slice(self.start, self.end), definition)
        } else {
            let reference_year = self.reference_year.unwrap_or_else(|| ctx.today.year());
            stats_folded(
                frame,
                self.freq,
                self.aggregation,
                self.interpolation,
                cutoff_year,
                reference_year,
            )?
        };

        let table = stats.to_data_table(&ctx.index_label);
        let metadata = assemble_metadata(
            &self.descriptor,
            primary_column(&table),
            ctx,
            true,
            self.envelope_block(&definition),
        );

        Ok(RenderedChart { table, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReshapeError;
    use crate::frame::TimeSeries;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(first_year: i32, last_year: i32) -> Frame {
        let points = (first_year..=last_year).flat_map(|y| {
            (1..=12).map(move |m| (date(y, m, 1), (y - first_year) as f64 * 10.0 + m as f64))
        });
        Frame::from_series("price", &TimeSeries::from_values(points).unwrap())
    }

    fn ctx() -> ChartContext {
        ChartContext::default().with_today(date(2023, 6, 15))
    }

    #[test]
    fn test_folded_layout() {
        let chart = SeasonalChart::new(ChartDescriptor::new("Price").with_unit("EUR"))
            .with_frequency(Frequency::Month, Aggregation::Mean)
            .folded();
        let rendered = chart.render(&monthly(2019, 2023), &ctx()).unwrap();

        assert_eq!(
            rendered.table.columns,
            vec!["date", "2023", "Min 19-22", "Max 19-22", "Mean 19-22"]
        );
        assert_eq!(rendered.table.len(), 12);

        let visualize = &rendered.metadata["visualize"];
        assert_eq!(visualize["line-dashes"]["Mean 19-22"], json!(3));
        assert_eq!(visualize["x-tick-format"], json!("MMMM"));
        assert_eq!(visualize["custom-area-fills"][0]["from"], json!("Min 19-22"));
        assert_eq!(
            rendered.metadata["data"]["column-format"]["2023"]["number-append"],
            json!(" EUR")
        );
    }

    #[test]
    fn test_unfolded_window() {
        let chart = SeasonalChart::new(ChartDescriptor::new("Price"))
            .with_frequency(Frequency::Month, Aggregation::Mean)
            .with_cutoff_year(2022)
            .with_window(Some(date(2023, 1, 1)), None);
        let rendered = chart.render(&monthly(2019, 2023), &ctx()).unwrap();

        assert_eq!(
            rendered.table.columns,
            vec!["date", "price", "Min 19-21", "Max 19-21", "Mean 19-21"]
        );
        assert_eq!(rendered.table.len(), 12);
        // January: 1, 11, 21 over the baseline
        assert_eq!(rendered.table.rows[0][2].as_number(), Some(1.0));
        assert_eq!(rendered.table.rows[0][4].as_number(), Some(11.0));
        assert_eq!(rendered.metadata["visualize"]["tooltip-x-format"], json!("ll"));
    }

    #[test]
    fn test_default_cutoff_is_current_year() {
        let chart = SeasonalChart::new(ChartDescriptor::new("Price"))
            .with_frequency(Frequency::Month, Aggregation::Mean);
        let today = ChartContext::default().with_today(date(2019, 3, 1));

        assert!(matches!(
            chart.render(&monthly(2019, 2023), &today),
            Err(ReshapeError::InvalidCutoff { cutoff_year: 2019, .. })
        ));
    }
}
