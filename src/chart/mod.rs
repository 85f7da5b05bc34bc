//! Chart payloads
//!
//! A chart payload turns a [`Frame`] into what the chart service needs: a
//! [`DataTable`] and a metadata document. Payload kinds:
//!
//! - **overlay**: lines, stacked areas, stacked columns
//! - **seasonal**: folded or unfolded min/max/mean envelope
//! - **table**: hierarchical summary table with sparklines
//!
//! The [`Publisher`] sequences the service calls for one payload.

pub mod metadata;
pub mod overlay;
pub mod publisher;
pub mod seasonal;
pub mod table;

pub use metadata::{merge, merge_all, LabelKind, LabelPolicy, Palette, PublishSettings};
pub use overlay::{OverlayChart, OverlayStyle};
pub use publisher::{PublishError, PublishReport, PublishResult, Publisher};
pub use seasonal::SeasonalChart;
pub use table::TableChart;

use crate::error::ReshapeResult;
use crate::frame::{DataTable, Frame};
use chrono::{NaiveDate, Utc};
use serde_json::Value;

/// Chart type identifiers understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Lines,
    Area,
    StackedColumn,
    Table,
}

impl ChartType {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Lines => "d3-lines",
            Self::Area => "d3-area",
            Self::StackedColumn => "stacked-column-chart",
            Self::Table => "tables",
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Texts shared by every chart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDescriptor {
    pub title: String,
    /// Source line under the chart
    pub source: String,
    pub notes: String,
    /// Unit appended to the primary values
    pub unit: String,
}

impl ChartDescriptor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// Settings shared by every payload of one run
#[derive(Debug, Clone, PartialEq)]
pub struct ChartContext {
    /// Date used for today markers and default cutoffs
    pub today: NaiveDate,
    pub publish: PublishSettings,
    pub palette: Palette,
    pub label_policy: LabelPolicy,
    /// Header of the time axis column
    pub index_label: String,
}

impl Default for ChartContext {
    fn default() -> Self {
        Self {
            today: Utc::now().date_naive(),
            publish: PublishSettings::default(),
            palette: Palette::default(),
            label_policy: LabelPolicy::default(),
            index_label: "date".to_string(),
        }
    }
}

impl ChartContext {
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Data and metadata ready to upload
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub table: DataTable,
    pub metadata: Value,
}

impl RenderedChart {
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        self.table.to_csv()
    }
}

/// A chart kind: reshaping plus its metadata contribution
pub trait ChartPayload: Send + Sync {
    fn descriptor(&self) -> &ChartDescriptor;

    fn chart_type(&self) -> ChartType;

    /// Reshape `frame` and build the full metadata document
    fn render(&self, frame: &Frame, ctx: &ChartContext) -> ReshapeResult<RenderedChart>;
}

/// Chart-specific block plus the blocks every chart carries: unit suffix,
/// size, notes and optionally a today marker
///
/// `unit_column` is the second column of time-axis tables; summary tables
/// carry their unit in the legend header instead.
pub(crate) fn assemble_metadata(
    descriptor: &ChartDescriptor,
    unit_column: Option<&str>,
    ctx: &ChartContext,
    display_today: bool,
    specific: Value,
) -> Value {
    let mut blocks = Vec::new();
    if let Some(column) = unit_column {
        blocks.push(metadata::unit_block(column, &descriptor.unit));
    }
    blocks.push(specific);
    blocks.push(ctx.publish.block());
    blocks.push(metadata::notes_block(&descriptor.notes));
    if display_today {
        blocks.push(metadata::today_line(ctx.today));
    }
    merge_all(&blocks)
}

/// First value column of a time-axis table
pub(crate) fn primary_column(table: &DataTable) -> Option<&str> {
    table.columns.get(1).map(String::as_str)
}
