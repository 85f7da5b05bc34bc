//! Min/max/mean envelopes across historical years
//!
//! Two modes:
//! - **folded**: years projected onto one reference year, the envelope is
//!   computed row-wise over the year columns before the cutoff
//! - **unfolded**: the envelope is computed per seasonal position over the
//!   baseline and joined back onto the real historical axis

use crate::error::{ReshapeError, ReshapeResult};
use crate::frame::{resample, Aggregation, Frame, Frequency, Interpolation, TimeSeries};
use crate::seasonal::fold::fold_resampled;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One of the three envelope statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalStat {
    Min,
    Max,
    Mean,
}

impl SeasonalStat {
    fn aggregation(&self) -> Aggregation {
        match self {
            Self::Min => Aggregation::Min,
            Self::Max => Aggregation::Max,
            Self::Mean => Aggregation::Mean,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Mean => "Mean",
        }
    }
}

/// A named envelope column and the years it covers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatColumn {
    pub stat: SeasonalStat,
    /// Display name, e.g. `Min 15-22`
    pub name: String,
    pub first_year: i32,
    pub last_year: i32,
}

impl StatColumn {
    fn new(stat: SeasonalStat, first_year: i32, last_year: i32) -> Self {
        Self {
            stat,
            name: format!(
                "{} {:02}-{:02}",
                stat.title(),
                first_year.rem_euclid(100),
                last_year.rem_euclid(100)
            ),
            first_year,
            last_year,
        }
    }
}

/// The three envelope columns produced by a seasonal computation
///
/// Only years strictly before `cutoff_year` contribute to the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalStatDefinition {
    pub cutoff_year: i32,
    pub min: StatColumn,
    pub max: StatColumn,
    pub mean: StatColumn,
}

impl SeasonalStatDefinition {
    pub fn new(cutoff_year: i32, first_year: i32, last_year: i32) -> Self {
        Self {
            cutoff_year,
            min: StatColumn::new(SeasonalStat::Min, first_year, last_year),
            max: StatColumn::new(SeasonalStat::Max, first_year, last_year),
            mean: StatColumn::new(SeasonalStat::Mean, first_year, last_year),
        }
    }

    /// Columns in output order: min, max, mean
    pub fn columns(&self) -> [&StatColumn; 3] {
        [&self.min, &self.max, &self.mean]
    }

    pub fn get(&self, stat: SeasonalStat) -> &StatColumn {
        match stat {
            SeasonalStat::Min => &self.min,
            SeasonalStat::Max => &self.max,
            SeasonalStat::Mean => &self.mean,
        }
    }

    /// Whether `year` belongs to the baseline
    pub fn includes_year(&self, year: i32) -> bool {
        year < self.cutoff_year
    }
}

/// Envelope of the values sharing one seasonal position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Envelope {
    fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            min: Aggregation::Min.apply(values)?,
            max: Aggregation::Max.apply(values)?,
            mean: Aggregation::Mean.apply(values)?,
        })
    }

    pub fn get(&self, stat: SeasonalStat) -> f64 {
        match stat {
            SeasonalStat::Min => self.min,
            SeasonalStat::Max => self.max,
            SeasonalStat::Mean => self.mean,
        }
    }
}

/// Group points by seasonal position and compute one envelope per position
///
/// Points may come in any order.
pub fn seasonal_envelope(
    points: impl IntoIterator<Item = (NaiveDate, f64)>,
    freq: Frequency,
) -> BTreeMap<u32, Envelope> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (date, value) in points {
        groups.entry(freq.seasonal_position(date)).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(position, values)| Envelope::from_values(&values).map(|e| (position, e)))
        .collect()
}

fn univariate(frame: &Frame) -> ReshapeResult<TimeSeries> {
    if frame.width() != 1 {
        return Err(ReshapeError::NonUnivariateInput(frame.width()));
    }
    let name = frame.columns()[0].name.clone();
    frame.series(&name)
}

fn resample_and_fill(
    series: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
    interpolation: Option<Interpolation>,
) -> ReshapeResult<TimeSeries> {
    let resampled = resample(series, freq, agg)?;
    match interpolation {
        Some(method) => {
            let filled = method.apply(resampled.index(), resampled.values());
            TimeSeries::from_points(resampled.index().iter().copied().zip(filled))
        }
        None => Ok(resampled),
    }
}

fn check_cutoff(series: &TimeSeries, cutoff_year: i32) -> ReshapeResult<i32> {
    let first_year = series
        .first_valid_year()
        .ok_or_else(|| {
            ReshapeError::EmptySeries("no values to build seasonal statistics".to_string())
        })?;
    if cutoff_year <= first_year {
        return Err(ReshapeError::InvalidCutoff {
            cutoff_year,
            first_year,
        });
    }
    Ok(first_year)
}

/// Seasonal statistics on a calendar-folded frame
///
/// Output columns: the comparison years (`>= cutoff_year`, ascending), then
/// the min, max and mean envelope of the earlier years. Rows are the
/// `freq` periods of `reference_year`.
pub fn stats_folded(
    frame: &Frame,
    freq: Frequency,
    agg: Aggregation,
    interpolation: Option<Interpolation>,
    cutoff_year: i32,
    reference_year: i32,
) -> ReshapeResult<(Frame, SeasonalStatDefinition)> {
    let series = univariate(frame)?;
    if series.is_all_null() {
        return Err(ReshapeError::EmptySeries(
            "no values to build seasonal statistics".to_string(),
        ));
    }
    let series = resample_and_fill(&series, freq, agg, interpolation)?;
    let first_valid_year = check_cutoff(&series, cutoff_year)?;

    let folded = fold_resampled(&series, freq, agg, reference_year)?;
    let (baseline, comparison): (Vec<_>, Vec<_>) = folded
        .years
        .iter()
        .partition(|(year, _)| **year < cutoff_year);

    // Years without a single value keep their fold column but are not covered
    let covered: BTreeSet<i32> = series
        .iter()
        .filter_map(|(date, value)| value.map(|_| date.year()))
        .filter(|year| *year < cutoff_year)
        .collect();
    let (first_year, last_year) = match (covered.iter().next(), covered.iter().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ReshapeError::InvalidCutoff {
                cutoff_year,
                first_year: first_valid_year,
            })
        }
    };
    let definition = SeasonalStatDefinition::new(cutoff_year, first_year, last_year);

    let mut output = Frame::new(folded.labels.clone())?;
    for (year, values) in &comparison {
        output.push_column(year.to_string(), (*values).clone())?;
    }
    for column in definition.columns() {
        let agg = column.stat.aggregation();
        let values = (0..folded.labels.len())
            .map(|row| {
                let cells: Vec<Option<f64>> =
                    baseline.iter().map(|(_, values)| values[row]).collect();
                agg.apply_nullable(&cells)
            })
            .collect();
        output.push_column(column.name.clone(), values)?;
    }

    tracing::debug!(
        cutoff_year,
        baseline_years = baseline.len(),
        comparison_years = comparison.len(),
        rows = output.len(),
        "Computed folded seasonal statistics"
    );

    Ok((output, definition))
}

/// Seasonal statistics on the real historical axis
///
/// Output columns: the source column, then min, max and mean of the baseline
/// (dates before `cutoff_year-01-01`) at the same seasonal position. Rows
/// whose position never occurs in the baseline keep null statistics.
pub fn stats_unfolded(
    frame: &Frame,
    freq: Frequency,
    agg: Aggregation,
    interpolation: Option<Interpolation>,
    cutoff_year: i32,
) -> ReshapeResult<(Frame, SeasonalStatDefinition)> {
    let series = univariate(frame)?;
    let name = frame.columns()[0].name.clone();
    if series.is_all_null() {
        return Err(ReshapeError::EmptySeries(name));
    }

    let resampled = resample_and_fill(&series, freq, agg, interpolation)?;
    let first_year = check_cutoff(&resampled, cutoff_year)?;
    let cutoff = NaiveDate::from_ymd_opt(cutoff_year, 1, 1).ok_or(ReshapeError::InvalidCutoff {
        cutoff_year,
        first_year,
    })?;

    let baseline: Vec<(NaiveDate, f64)> = resampled
        .filter_dates(|date| date < cutoff)
        .iter()
        .filter_map(|(date, value)| value.map(|v| (date, v)))
        .collect();

    let (first, last) = match (baseline.first(), baseline.last()) {
        (Some((first, _)), Some((last, _))) => (first.year(), last.year()),
        _ => {
            return Err(ReshapeError::InvalidCutoff {
                cutoff_year,
                first_year,
            })
        }
    };
    let definition = SeasonalStatDefinition::new(cutoff_year, first, last);
    let envelopes = seasonal_envelope(baseline, freq);

    let mut output = Frame::new(resampled.index().to_vec())?;
    output.push_column(name, resampled.values().to_vec())?;
    for column in definition.columns() {
        let values = resampled
            .index()
            .iter()
            .map(|date| {
                envelopes
                    .get(&freq.seasonal_position(*date))
                    .map(|envelope| envelope.get(column.stat))
            })
            .collect();
        output.push_column(column.name.clone(), values)?;
    }

    tracing::debug!(
        cutoff_year,
        positions = envelopes.len(),
        rows = output.len(),
        "Computed unfolded seasonal statistics"
    );

    Ok((output, definition))
}
