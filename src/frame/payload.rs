//! Plain tabular payload handed to the chart service
//!
//! The first column of a [`DataTable`] is always the time axis (or, for
//! hierarchical tables, the legend column). It is uploaded as CSV.

use crate::frame::types::Frame;
use serde::Serialize;

/// One cell of a [`DataTable`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(Option<f64>),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(Some(v)) => v.to_string(),
            Cell::Number(None) => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

/// Header plus rows, in rendering order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Number of columns, the leading axis column included
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV with a header row
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::render))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Frame {
    /// Reset the date index into a leading column named `index_label`
    pub fn to_data_table(&self, index_label: &str) -> DataTable {
        let mut columns = vec![index_label.to_string()];
        columns.extend(self.columns().iter().map(|c| c.name.clone()));

        let rows = self
            .index()
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let mut row = vec![Cell::Text(date.format("%Y-%m-%d").to_string())];
                row.extend(self.row(i).into_iter().map(Cell::Number));
                row
            })
            .collect();

        DataTable { columns, rows }
    }
}
