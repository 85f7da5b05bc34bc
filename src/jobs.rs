//! Chart job files
//!
//! A job file lists the charts to publish, one `[[charts]]` table each:
//!
//! ```toml
//! [[charts]]
//! title = "French power prices"
//! kind = "seasonal"
//! data = "prices.csv"
//! columns = ["fr"]
//! freq = "W"
//! cutoff_year = 2024
//! unit = "EUR/MWh"
//! source = "EPEX"
//!
//! [[charts]]
//! title = "Renewables"
//! kind = "table"
//! data = "renewables.csv"
//! freq = "M"
//! unit = "TWh"
//!
//!   [[charts.hierarchy.L1]]
//!   legend = "Total"
//!   aggregation_freq = "sum"
//! ```
//!
//! Relative data paths are resolved against the job file's directory.

use crate::chart::{
    ChartDescriptor, ChartPayload, OverlayChart, OverlayStyle, SeasonalChart, TableChart,
};
use crate::dates::evaluate_at;
use crate::error::ReshapeError;
use crate::frame::{Aggregation, Frame, Frequency, Interpolation};
use crate::loader::{CsvLoader, LoadError};
use crate::overlay::OverlayOptions;
use crate::table::Hierarchy;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Job file errors
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read job file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse job file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid job '{title}': {reason}")]
    Invalid { title: String, reason: String },

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type JobResult<T> = Result<T, JobError>;

/// Kind of chart a job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Lines,
    Area,
    StackedBar,
    Seasonal,
    Table,
}

/// One `[[charts]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ChartJob {
    pub title: String,
    pub kind: ChartKind,
    /// CSV file holding the data
    pub data: PathBuf,

    /// Value columns to load; all when empty
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,

    #[serde(default = "default_freq")]
    pub freq: Frequency,
    #[serde(default = "default_aggregation")]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub interpolation: Option<Interpolation>,

    #[serde(default)]
    pub cutoff_year: Option<i32>,
    #[serde(default)]
    pub reference_year: Option<i32>,
    #[serde(default = "default_true")]
    pub unfold: bool,

    #[serde(default)]
    pub secondary: bool,
    #[serde(default)]
    pub secondary_unit: String,
    #[serde(default = "default_true")]
    pub display_today: bool,

    /// Relative-date expression bounding the window
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,

    #[serde(default)]
    pub hierarchy: Option<Hierarchy>,

    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub notes: String,
}

fn default_freq() -> Frequency {
    Frequency::Day
}

fn default_aggregation() -> Aggregation {
    Aggregation::Mean
}

fn default_true() -> bool {
    true
}

impl ChartJob {
    fn descriptor(&self) -> ChartDescriptor {
        ChartDescriptor::new(self.title.clone())
            .with_source(self.source.clone())
            .with_notes(self.notes.clone())
            .with_unit(self.unit.clone())
    }

    fn invalid(&self, reason: &str) -> JobError {
        JobError::Invalid {
            title: self.title.clone(),
            reason: reason.to_string(),
        }
    }

    /// Resolve the window expressions against `today`
    pub fn window(&self, today: NaiveDate) -> JobResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let start = evaluate_at(self.start.as_deref(), today)?.date();
        let end = evaluate_at(self.end.as_deref(), today)?.date();
        Ok((start, end))
    }

    /// Build the chart payload for a run on `today`
    pub fn payload(&self, today: NaiveDate) -> JobResult<Box<dyn ChartPayload>> {
        let descriptor = self.descriptor();
        let (start, end) = self.window(today)?;

        let style = match self.kind {
            ChartKind::Lines => Some(OverlayStyle::Lines),
            ChartKind::Area => Some(OverlayStyle::Area),
            ChartKind::StackedBar => Some(OverlayStyle::StackedBar),
            ChartKind::Seasonal | ChartKind::Table => None,
        };
        if self.secondary && self.kind != ChartKind::Lines {
            return Err(self.invalid("a secondary axis is only available on line charts"));
        }

        let payload: Box<dyn ChartPayload> = match (self.kind, style) {
            (_, Some(style)) => {
                let mut options = OverlayOptions::new()
                    .with_secondary(self.secondary)
                    .with_window(start, end);
                options.interpolation = self.interpolation;
                Box::new(
                    OverlayChart::new(descriptor, style)
                        .with_options(options)
                        .with_secondary_unit(self.secondary_unit.clone())
                        .with_display_today(self.display_today),
                )
            }
            (ChartKind::Seasonal, _) => {
                let mut chart = SeasonalChart::new(descriptor)
                    .with_frequency(self.freq, self.aggregation)
                    .with_window(start, end);
                chart.interpolation = self.interpolation;
                chart.cutoff_year = self.cutoff_year;
                chart.reference_year = self.reference_year;
                chart.unfold = self.unfold;
                Box::new(chart)
            }
            _ => {
                let hierarchy = self
                    .hierarchy
                    .clone()
                    .ok_or_else(|| self.invalid("a table needs a hierarchy"))?;
                Box::new(TableChart::new(descriptor, hierarchy, self.freq))
            }
        };
        Ok(payload)
    }

    /// Load the job's data, resolving a relative path against `base_dir`
    pub fn load_frame(&self, base_dir: &Path) -> JobResult<Frame> {
        let path = if self.data.is_absolute() {
            self.data.clone()
        } else {
            base_dir.join(&self.data)
        };

        let mut loader = CsvLoader::new();
        if let Some(column) = &self.date_column {
            loader = loader.with_date_column(column);
        }
        if let Some(format) = &self.date_format {
            loader = loader.with_date_format(format);
        }
        if !self.columns.is_empty() {
            loader = loader.with_columns(self.columns.clone());
        }
        Ok(loader.load(&path)?)
    }
}

/// A parsed job file
#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub charts: Vec<ChartJob>,

    /// Directory data paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl JobFile {
    pub fn load(path: &Path) -> JobResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| JobError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let mut jobs = Self::parse(&content).map_err(|error| JobError::Parse {
            path: path.to_path_buf(),
            error,
        })?;
        jobs.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), charts = jobs.charts.len(), "Loaded job file");
        Ok(jobs)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Find a job by title
    pub fn find(&self, title: &str) -> Option<&ChartJob> {
        self.charts.iter().find(|job| job.title == title)
    }

    pub fn load_frame(&self, job: &ChartJob) -> JobResult<Frame> {
        job.load_frame(&self.base_dir)
    }
}
