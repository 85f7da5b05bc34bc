//! Overlay charts: lines, stacked areas and stacked columns
//!
//! All three share the overlay reshaping; they differ in chart type and in
//! their `visualize` block. Lines additionally support a secondary axis whose
//! original values are annotated along the rescaled line.

use crate::chart::metadata::LabelKind;
use crate::chart::{
    assemble_metadata, primary_column, ChartContext, ChartDescriptor, ChartPayload, ChartType,
    RenderedChart,
};
use crate::error::ReshapeResult;
use crate::frame::Frame;
use crate::overlay::{overlay, OverlayFrame, OverlayOptions};
use serde_json::{json, Value};

/// Number of chunks the secondary line is split into for annotations
const SECONDARY_LABEL_CHUNKS: usize = 5;

/// Rendering style of an overlay chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    Lines,
    Area,
    StackedBar,
}

impl OverlayStyle {
    fn chart_type(&self) -> ChartType {
        match self {
            Self::Lines => ChartType::Lines,
            Self::Area => ChartType::Area,
            Self::StackedBar => ChartType::StackedColumn,
        }
    }
}

/// Wide multi-series chart
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayChart {
    pub descriptor: ChartDescriptor,
    pub style: OverlayStyle,
    pub options: OverlayOptions,
    /// Unit printed in secondary annotations
    pub secondary_unit: String,
    pub display_today: bool,
}

impl OverlayChart {
    pub fn new(descriptor: ChartDescriptor, style: OverlayStyle) -> Self {
        Self {
            descriptor,
            style,
            options: OverlayOptions::default(),
            secondary_unit: String::new(),
            display_today: true,
        }
    }

    pub fn with_options(mut self, options: OverlayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_secondary_unit(mut self, unit: impl Into<String>) -> Self {
        self.secondary_unit = unit.into();
        self
    }

    pub fn with_display_today(mut self, display_today: bool) -> Self {
        self.display_today = display_today;
        self
    }

    fn lines_block(&self, reshaped: &OverlayFrame, ctx: &ChartContext) -> Value {
        let legends = reshaped.frame.column_names();
        let secondary = reshaped.is_secondary();
        let annotations: Vec<Value> = reshaped
            .secondary_labels(SECONDARY_LABEL_CHUNKS)
            .into_iter()
            .map(|label| {
                json!({
                    "x": label.date.format("%Y/%m/%d %H:%M").to_string(),
                    "connectorLine": {
                        "enabled": true,
                        "stroke": 1,
                        "targetPadding": 1,
                        "type": "straight",
                        "arrowHead": false,
                    },
                    "y": label.rescaled,
                    "size": 10,
                    "align": "mc",
                    "dx": 0,
                    "dy": 40,
                    "text": format!("{:.1} {}", label.unscaled, self.secondary_unit),
                })
            })
            .collect();

        json!({
            "visualize": {
                "x-grid": "ticks",
                "y-grid": "on",
                "custom-colors": ctx.palette.assign(legends.iter().copied()),
                "scale-y": "linear",
                "labeling": ctx.label_policy.labeling(LabelKind::Line, legends.len(), secondary),
                "base-color": 7,
                "label-colors": true,
                "interpolation": "linear",
                "show-tooltips": !secondary,
                "y-grid-labels": "inside",
                "line-symbols": false,
                "text-annotations": annotations,
            }
        })
    }

    fn area_block(&self, reshaped: &OverlayFrame, ctx: &ChartContext) -> Value {
        let legends = reshaped.frame.column_names();
        json!({
            "visualize": {
                "x-grid": "ticks",
                "y-grid": "on",
                "custom-colors": ctx.palette.assign(legends.iter().copied()),
                "scale-y": "linear",
                "sharing": {
                    "auto": true,
                    "enabled": false,
                },
                "area-opacity": 1,
                "area-separator-color": 0,
                "sort-areas": "keep",
                "stack-areas": true,
                "labeling": ctx.label_policy.labeling(LabelKind::Block, legends.len(), false),
                "base-color": 7,
                "label-colors": true,
                "interpolation": "linear",
                "show-tooltips": true,
                "y-grid-format": "auto",
                "y-grid-labels": "outside",
            }
        })
    }

    fn stacked_bar_block(&self, reshaped: &OverlayFrame, ctx: &ChartContext) -> Value {
        let legends = reshaped.frame.column_names();
        json!({
            "data": {
                "transpose": true,
            },
            "visualize": {
                "x-grid": "ticks",
                "y-grid": "on",
                "custom-colors": ctx.palette.assign(legends.iter().copied()),
                "labeling": ctx.label_policy.labeling(LabelKind::Block, legends.len(), false),
                "category": "direct",
                "valueLabels": {
                    "show": "always",
                    "enabled": true,
                },
                "categoryLabels": {
                    "enabled": true,
                    "position": "color-key",
                },
                "y-grid-labels": "inside",
                "chart-type-set": true,
                "color-key": true,
            }
        })
    }
}

impl ChartPayload for OverlayChart {
    fn descriptor(&self) -> &ChartDescriptor {
        &self.descriptor
    }

    fn chart_type(&self) -> ChartType {
        self.style.chart_type()
    }

    fn render(&self, frame: &Frame, ctx: &ChartContext) -> ReshapeResult<RenderedChart> {
        let reshaped = overlay(frame, &self.options)?;
        let table = reshaped.to_data_table(&ctx.index_label);

        let specific = match self.style {
            OverlayStyle::Lines => self.lines_block(&reshaped, ctx),
            OverlayStyle::Area => self.area_block(&reshaped, ctx),
            OverlayStyle::StackedBar => self.stacked_bar_block(&reshaped, ctx),
        };
        let metadata = assemble_metadata(
            &self.descriptor,
            primary_column(&table),
            ctx,
            self.display_today,
            specific,
        );

        Ok(RenderedChart { table, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Palette;
    use crate::error::ReshapeError;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame() -> Frame {
        let index: Vec<NaiveDate> = (1..=10).map(|d| date(2024, 1, d)).collect();
        Frame::new(index)
            .unwrap()
            .with_column("power", (1..=10).map(|v| Some(v as f64 * 10.0)).collect())
            .unwrap()
            .with_column("gas", (1..=10).map(|v| Some((v * v) as f64)).collect())
            .unwrap()
    }

    fn ctx() -> ChartContext {
        ChartContext::default().with_today(date(2024, 1, 5))
    }

    #[test]
    fn test_lines_metadata() {
        let chart =
            OverlayChart::new(ChartDescriptor::new("Power").with_unit("MW"), OverlayStyle::Lines);
        let rendered = chart.render(&frame(), &ctx()).unwrap();

        assert_eq!(rendered.table.columns, vec!["date", "power", "gas"]);
        let visualize = &rendered.metadata["visualize"];
        assert_eq!(visualize["labeling"], json!("top"));
        assert_eq!(visualize["show-tooltips"], json!(true));
        assert_eq!(visualize["custom-colors"], json!({"power": 7, "gas": 2}));
        assert_eq!(visualize["text-annotations"], json!([]));
        assert_eq!(
            visualize["range-annotations"][0]["x0"],
            json!("05/01/2024 00:00")
        );
        assert_eq!(
            rendered.metadata["data"]["column-format"]["power"]["number-append"],
            json!(" MW")
        );
        assert_eq!(chart.chart_type(), ChartType::Lines);
    }

    #[test]
    fn test_secondary_lines_annotations() {
        let chart = OverlayChart::new(ChartDescriptor::new("Power"), OverlayStyle::Lines)
            .with_options(OverlayOptions::new().with_secondary(true))
            .with_secondary_unit("EUR");
        let rendered = chart.render(&frame(), &ctx()).unwrap();

        let visualize = &rendered.metadata["visualize"];
        assert_eq!(visualize["labeling"], json!("right"));
        assert_eq!(visualize["show-tooltips"], json!(false));

        // 10 rows in 5 chunks of 2: annotated rows 1, 3, 5 and 7
        let annotations = visualize["text-annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 4);
        assert_eq!(annotations[0]["x"], json!("2024/01/02 00:00"));
        assert_eq!(annotations[0]["text"], json!("4.0 EUR"));
        assert_eq!(annotations[3]["text"], json!("64.0 EUR"));
    }

    #[test]
    fn test_area_and_bar_blocks() {
        let ctx = ChartContext {
            palette: Palette::new(vec![1, 2], 1),
            ..ctx()
        };

        let area = OverlayChart::new(ChartDescriptor::new("a"), OverlayStyle::Area)
            .with_display_today(false)
            .render(&frame(), &ctx)
            .unwrap();
        assert_eq!(area.metadata["visualize"]["stack-areas"], json!(true));
        assert_eq!(area.metadata["visualize"]["custom-colors"], json!({"power": 2, "gas": 1}));
        assert!(area.metadata["visualize"].get("range-annotations").is_none());

        let full = frame();
        let single = Frame::new(full.index().to_vec())
            .unwrap()
            .with_column("power", full.columns()[0].values.clone())
            .unwrap();
        let bar = OverlayChart::new(ChartDescriptor::new("b"), OverlayStyle::StackedBar)
            .render(&single, &ctx)
            .unwrap();
        assert_eq!(bar.metadata["data"]["transpose"], json!(true));
        assert_eq!(bar.metadata["visualize"]["labeling"], json!("off"));
    }

    #[test]
    fn test_reshape_errors_propagate() {
        let chart = OverlayChart::new(ChartDescriptor::new("x"), OverlayStyle::Lines)
            .with_options(OverlayOptions::new().with_secondary(true));
        let wide = frame().with_column("coal", vec![None; 10]).unwrap();

        assert!(matches!(
            chart.render(&wide, &ctx()),
            Err(ReshapeError::SecondaryAxisArityError(3))
        ));
    }
}
