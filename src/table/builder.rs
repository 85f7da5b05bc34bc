//! Hierarchical table assembly
//!
//! ```text
//! frame ─ resample per legend ─ pre-order rows ─┬─ sparkline axis ─┐
//!                                               └─ pretty axis ────┴─ concat
//! ```
//!
//! Legends become rows and periods become columns. The first column, headed
//! by the unit label, holds the indented legends.

use crate::error::{ReshapeError, ReshapeResult};
use crate::frame::{resample_frame, Aggregation, Cell, DataTable, Frame, Frequency};
use crate::table::hierarchy::{Hierarchy, Level};
use chrono::NaiveDate;

/// A reshaped summary table
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalTable {
    pub table: DataTable,
    /// Number of sparkline columns following the legend column
    pub sparkline_columns: usize,
    /// Level of each row, in row order
    pub levels: Vec<Level>,
    /// Resampled frame the table was built from, columns in row order
    pub resampled: Frame,
}

impl HierarchicalTable {
    /// Index of the last column before the current period, counting the legend column
    ///
    /// Equal to the number of periods plus the number of periods labelled
    /// strictly before `today`; the pretty columns at `+1` and `+2` open the
    /// current period.
    pub fn today_position(&self, today: NaiveDate) -> usize {
        let before = self.resampled.index().iter().filter(|d| **d < today).count();
        self.resampled.len() + before
    }

    /// Header of the legend column
    pub fn unit_label(&self) -> &str {
        self.table.columns.first().map(String::as_str).unwrap_or_default()
    }
}

/// Build a summary table from `frame` following `hierarchy`
///
/// Columns of `frame` that no legend refers to are discarded.
pub fn build_table(
    frame: &Frame,
    hierarchy: &Hierarchy,
    freq: Frequency,
    unit_label: &str,
) -> ReshapeResult<HierarchicalTable> {
    let rows = hierarchy.flatten();

    let mut selected = Frame::new(frame.index().to_vec())?;
    for (_, node) in &rows {
        let column = frame
            .column(&node.legend)
            .ok_or_else(|| ReshapeError::HierarchyLegendNotFound(node.legend.clone()))?;
        selected.push_column(column.name.clone(), column.values.clone())?;
    }

    let aggregations = hierarchy.aggregations();
    let resampled = resample_frame(&selected, freq, |name| {
        aggregations.get(name).copied().unwrap_or(Aggregation::Mean)
    })?;

    let periods = resampled.index();
    let mut columns = Vec::with_capacity(1 + 2 * periods.len());
    columns.push(unit_label.to_string());
    columns.extend(periods.iter().map(|d| freq.sparkline_label(*d)));
    columns.extend(periods.iter().map(|d| freq.pretty_label(*d)));

    let table_rows = rows
        .iter()
        .zip(resampled.columns())
        .map(|((level, node), column)| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(Cell::Text(level.indented(&node.legend)));
            row.extend(column.values.iter().map(|v| Cell::Number(*v)));
            row.extend(column.values.iter().map(|v| Cell::Number(*v)));
            row
        })
        .collect();

    tracing::debug!(
        rows = rows.len(),
        periods = periods.len(),
        freq = %freq,
        "Built hierarchical table"
    );

    Ok(HierarchicalTable {
        sparkline_columns: periods.len(),
        levels: rows.iter().map(|(level, _)| *level).collect(),
        table: DataTable {
            columns,
            rows: table_rows,
        },
        resampled,
    })
}
