//! Hierarchical summary table chart

use crate::chart::{
    assemble_metadata, ChartContext, ChartDescriptor, ChartPayload, ChartType, RenderedChart,
};
use crate::error::ReshapeResult;
use crate::frame::{Frame, Frequency};
use crate::table::{build_table, column_styles, header_style, row_styles, Hierarchy};
use serde_json::json;

/// Legends as rows, periods as sparkline and value columns
///
/// The unit is shown as the header of the legend column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableChart {
    pub descriptor: ChartDescriptor,
    pub hierarchy: Hierarchy,
    pub freq: Frequency,
}

impl TableChart {
    pub fn new(descriptor: ChartDescriptor, hierarchy: Hierarchy, freq: Frequency) -> Self {
        Self {
            descriptor,
            hierarchy,
            freq,
        }
    }
}

impl ChartPayload for TableChart {
    fn descriptor(&self) -> &ChartDescriptor {
        &self.descriptor
    }

    fn chart_type(&self) -> ChartType {
        ChartType::Table
    }

    fn render(&self, frame: &Frame, ctx: &ChartContext) -> ReshapeResult<RenderedChart> {
        let built = build_table(frame, &self.hierarchy, self.freq, &self.descriptor.unit)?;

        let specific = json!({
            "visualize": {
                "striped": true,
                "header": header_style(),
                "compactMode": true,
                "rows": row_styles(&built.levels),
                "columns": column_styles(&built, ctx.today),
            }
        });
        let metadata = assemble_metadata(&self.descriptor, None, ctx, false, specific);

        Ok(RenderedChart {
            table: built.table,
            metadata,
        })
    }
}
