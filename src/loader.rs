//! CSV Import
//!
//! Loads a wide CSV file into a [`Frame`]: the date column (first by default)
//! becomes the index, every other selected column a value column. Blank cells
//! are null; anything else that is not a number is an error.

use crate::error::ReshapeError;
use crate::frame::Frame;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Date formats tried after the configured one
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// CSV loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// CSV to frame loader with configurable column selection
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    /// Header of the date column; the first column when unset
    date_column: Option<String>,
    /// Format tried before the built-in ones
    date_format: Option<String>,
    /// Value columns to keep, in output order; all when unset
    columns: Option<Vec<String>>,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_column(mut self, column: &str) -> Self {
        self.date_column = Some(column.to_string());
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = Some(format.to_string());
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Parse a date using the configured format, then the common ones
    fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let configured = self.date_format.as_deref();
        for fmt in configured.into_iter().chain(DATE_FORMATS.iter().copied()) {
            if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
                return Some(date);
            }
        }
        for fmt in configured.into_iter().chain(DATETIME_FORMATS.iter().copied()) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(dt.date());
            }
        }
        DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
    }

    /// Load a CSV file
    pub fn load(&self, path: &Path) -> LoadResult<Frame> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| LoadError::Io {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        let frame = self.read(reader)?;
        tracing::debug!(
            path = %path.display(),
            rows = frame.len(),
            columns = frame.width(),
            "Loaded CSV"
        );
        Ok(frame)
    }

    /// Load from a CSV string
    pub fn load_str(&self, data: &str) -> LoadResult<Frame> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());
        self.read(reader)
    }

    fn read<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> LoadResult<Frame> {
        let headers = reader.headers()?.clone();
        let date_index = match &self.date_column {
            Some(name) => position(&headers, name)?,
            None => 0,
        };
        let selected: Vec<(usize, String)> = match &self.columns {
            Some(columns) => columns
                .iter()
                .map(|name| Ok((position(&headers, name)?, name.clone())))
                .collect::<LoadResult<_>>()?,
            None => headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != date_index)
                .map(|(i, name)| (i, name.trim().to_string()))
                .collect(),
        };

        let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let line = row + 2;
            let record = record?;

            let text = record.get(date_index).map(str::trim).unwrap_or_default();
            let date = self.parse_date(text).ok_or_else(|| LoadError::Parse {
                line,
                message: format!("could not parse date '{}'", text),
            })?;

            let values = selected
                .iter()
                .map(|(i, name)| {
                    let cell = record.get(*i).map(str::trim).unwrap_or_default();
                    if cell.is_empty() {
                        return Ok(None);
                    }
                    cell.parse::<f64>().map(Some).map_err(|_| LoadError::Parse {
                        line,
                        message: format!("column '{}': '{}' is not a number", name, cell),
                    })
                })
                .collect::<LoadResult<Vec<_>>>()?;
            rows.push((date, values));
        }

        rows.sort_by_key(|(date, _)| *date);
        let mut frame = Frame::new(rows.iter().map(|(date, _)| *date).collect())?;
        for (position, (_, name)) in selected.iter().enumerate() {
            let values = rows.iter().map(|(_, values)| values[position]).collect();
            frame.push_column(name.clone(), values)?;
        }
        Ok(frame)
    }
}

fn position(headers: &csv::StringRecord, name: &str) -> LoadResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}
