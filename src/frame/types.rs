//! Core tabular types
//!
//! - `TimeSeries`: one nullable value per date, dates strictly increasing
//! - `Frame`: several named columns sharing one date index
//! - `SeriesKey`: identifier/revision pair naming a fetched series

use crate::error::{ReshapeError, ReshapeResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A date-indexed series of nullable values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    index: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Build a series from (date, value) pairs in any order
    ///
    /// Pairs are sorted by date. Two pairs with the same date fail with
    /// [`ReshapeError::DuplicateTimestamp`].
    pub fn from_points(
        points: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> ReshapeResult<Self> {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by_key(|(date, _)| *date);

        for pair in points.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ReshapeError::DuplicateTimestamp(pair[0].0));
            }
        }

        let (index, values) = points.into_iter().unzip();
        Ok(Self { index, values })
    }

    /// Build a series from non-null values
    pub fn from_values(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> ReshapeResult<Self> {
        Self::from_points(points.into_iter().map(|(d, v)| (d, Some(v))))
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True when there is no non-null value at all
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Iterate over (date, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Year of the first non-null point
    pub fn first_valid_year(&self) -> Option<i32> {
        self.iter()
            .find(|(_, value)| value.is_some())
            .map(|(date, _)| date.year())
    }

    /// Keep only the points whose date satisfies `keep`
    pub fn filter_dates(&self, keep: impl Fn(NaiveDate) -> bool) -> Self {
        let (index, values) = self.iter().filter(|(date, _)| keep(*date)).unzip();
        Self { index, values }
    }
}

/// A named column of a [`Frame`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Named columns sharing one strictly increasing date index
///
/// Column order is significant: it drives stacking and rendering order
/// downstream and is preserved by every transform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame over `index`
    pub fn new(index: Vec<NaiveDate>) -> ReshapeResult<Self> {
        for pair in index.windows(2) {
            if pair[0] >= pair[1] {
                return Err(ReshapeError::DuplicateTimestamp(pair[1]));
            }
        }
        Ok(Self {
            index,
            columns: Vec::new(),
        })
    }

    /// Single-column frame from a series
    pub fn from_series(name: impl Into<String>, series: &TimeSeries) -> Self {
        Self {
            index: series.index.clone(),
            columns: vec![Column {
                name: name.into(),
                values: series.values.clone(),
            }],
        }
    }

    /// Outer-join named series onto the union of their dates
    ///
    /// Columns keep the order of `series`; dates missing from a series are null.
    pub fn align(series: Vec<(String, TimeSeries)>) -> ReshapeResult<Self> {
        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|(_, s)| s.index.iter().copied())
            .collect();
        let mut frame = Self::new(dates.into_iter().collect())?;

        for (name, s) in series {
            let lookup: BTreeMap<NaiveDate, Option<f64>> = s.iter().collect();
            let values = frame
                .index
                .iter()
                .map(|date| lookup.get(date).copied().flatten())
                .collect();
            frame.push_column(name, values)?;
        }

        Ok(frame)
    }

    /// Outer-join series fetched per identifier and revision
    ///
    /// Columns are named after the identifier; when one identifier comes with
    /// several revisions the revision is appended (`name@revision`).
    pub fn from_keyed(series: Vec<(SeriesKey, TimeSeries)>) -> ReshapeResult<Self> {
        let mut revisions: BTreeMap<&str, usize> = BTreeMap::new();
        for (key, _) in &series {
            *revisions.entry(key.identifier.as_str()).or_default() += 1;
        }
        let named: Vec<(String, TimeSeries)> = series
            .iter()
            .map(|(key, s)| {
                let name = if revisions.get(key.identifier.as_str()).copied().unwrap_or(0) > 1 {
                    key.to_string()
                } else {
                    key.identifier.clone()
                };
                (name, s.clone())
            })
            .collect();
        Self::align(named)
    }

    /// Append a column
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> ReshapeResult<()> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(ReshapeError::DuplicateColumn(name));
        }
        if values.len() != self.index.len() {
            return Err(ReshapeError::LengthMismatch {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Builder: append a column
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> ReshapeResult<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of value columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, position: usize) -> Option<&mut Column> {
        self.columns.get_mut(position)
    }

    /// Extract one column as a series
    pub fn series(&self, name: &str) -> ReshapeResult<TimeSeries> {
        let column = self
            .column(name)
            .ok_or_else(|| ReshapeError::ColumnNotFound(name.to_string()))?;
        Ok(TimeSeries {
            index: self.index.clone(),
            values: column.values.clone(),
        })
    }

    /// Keep the rows whose date lies in `[start, end]`; `None` leaves a side open
    pub fn slice(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let keep: Vec<bool> = self
            .index
            .iter()
            .map(|d| start.map_or(true, |s| *d >= s) && end.map_or(true, |e| *d <= e))
            .collect();
        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            values
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect()
        };

        Self {
            index: pick_dates(&self.index, &keep),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: pick(&c.values),
                })
                .collect(),
        }
    }

    /// Row `i` as nullable cells in column order
    pub fn row(&self, i: usize) -> Vec<Option<f64>> {
        self.columns
            .iter()
            .map(|c| c.values.get(i).copied().flatten())
            .collect()
    }
}

fn pick_dates(index: &[NaiveDate], keep: &[bool]) -> Vec<NaiveDate> {
    index
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(d, _)| *d)
        .collect()
}

/// Identifier and revision of a series fetched from a time-series store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub identifier: String,
    pub revision: String,
}

impl SeriesKey {
    pub fn new(identifier: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            revision: revision.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.identifier, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_sorted_on_creation() {
        let series = TimeSeries::from_values(vec![
            (date(2024, 1, 3), 3.0),
            (date(2024, 1, 1), 1.0),
            (date(2024, 1, 2), 2.0),
        ])
        .unwrap();

        assert_eq!(series.index()[0], date(2024, 1, 1));
        assert_eq!(series.values()[2], Some(3.0));
    }

    #[test]
    fn test_series_duplicate_date() {
        let result =
            TimeSeries::from_values(vec![(date(2024, 1, 1), 1.0), (date(2024, 1, 1), 2.0)]);
        assert!(matches!(result, Err(ReshapeError::DuplicateTimestamp(_))));
    }

    #[test]
    fn test_align_outer_join_keeps_column_order() {
        let a = TimeSeries::from_values(vec![(date(2024, 1, 1), 1.0), (date(2024, 1, 3), 3.0)])
            .unwrap();
        let b = TimeSeries::from_values(vec![(date(2024, 1, 2), 20.0)]).unwrap();

        let frame = Frame::align(vec![("zeta".into(), a), ("alpha".into(), b)]).unwrap();

        assert_eq!(frame.column_names(), vec!["zeta", "alpha"]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.column("zeta").unwrap().values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(frame.column("alpha").unwrap().values, vec![None, Some(20.0), None]);
    }

    #[test]
    fn test_push_column_checks() {
        let mut frame = Frame::new(vec![date(2024, 1, 1)]).unwrap();
        frame.push_column("a", vec![Some(1.0)]).unwrap();

        assert!(matches!(
            frame.push_column("a", vec![Some(1.0)]),
            Err(ReshapeError::DuplicateColumn(_))
        ));
        assert!(matches!(
            frame.push_column("b", vec![]),
            Err(ReshapeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_slice_open_bounds() {
        let frame = Frame::new(vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)])
            .unwrap()
            .with_column("a", vec![Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();

        let sliced = frame.slice(Some(date(2024, 1, 2)), None);
        assert_eq!(sliced.index(), &[date(2024, 1, 2), date(2024, 1, 3)]);

        let sliced = frame.slice(None, Some(date(2024, 1, 2)));
        assert_eq!(sliced.column("a").unwrap().values, vec![Some(1.0), Some(2.0)]);

        assert_eq!(frame.slice(None, None), frame);
    }

    #[test]
    fn test_from_keyed_names_revisions_only_when_needed() {
        let s = TimeSeries::from_values(vec![(date(2024, 1, 1), 1.0)]).unwrap();
        let frame = Frame::from_keyed(vec![
            (SeriesKey::new("power.fr", "latest"), s.clone()),
            (SeriesKey::new("power.fr", "2024-01-01"), s.clone()),
            (SeriesKey::new("gas.de", "latest"), s),
        ])
        .unwrap();

        assert_eq!(
            frame.column_names(),
            vec!["power.fr@latest", "power.fr@2024-01-01", "gas.de"]
        );
    }
}
