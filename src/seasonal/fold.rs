//! Calendar folding
//!
//! Projects every year of a series onto one reference year so the years can
//! be overlaid. Each resampled period keeps its offset within its own year
//! (days for daily and weekly data, months for coarser data); offsets past the
//! end of the reference year clamp onto its last day, and a final resample
//! over the reference-year periods merges whatever collides there.

use crate::error::{ReshapeError, ReshapeResult};
use crate::frame::{resample, Aggregation, Frame, Frequency, TimeSeries};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// A series folded onto one reference year, one value vector per source year
#[derive(Debug, Clone)]
pub(crate) struct FoldedYears {
    pub labels: Vec<NaiveDate>,
    pub years: BTreeMap<i32, Vec<Option<f64>>>,
}

impl FoldedYears {
    pub fn into_frame(self) -> ReshapeResult<Frame> {
        let mut frame = Frame::new(self.labels)?;
        for (year, values) in self.years {
            frame.push_column(year.to_string(), values)?;
        }
        Ok(frame)
    }
}

/// Date in `reference_year` holding the same position as `label` in its own year
pub fn reference_date(label: NaiveDate, freq: Frequency, reference_year: i32) -> Option<NaiveDate> {
    match freq {
        Frequency::Day | Frequency::Week => {
            let start = NaiveDate::from_ymd_opt(reference_year, 1, 1)?;
            let end = NaiveDate::from_ymd_opt(reference_year, 12, 31)?;
            let shifted = start + Duration::days(label.ordinal0() as i64);
            Some(shifted.min(end))
        }
        Frequency::Month | Frequency::Quarter | Frequency::Year => {
            NaiveDate::from_ymd_opt(reference_year, label.month(), 1)
        }
    }
}

pub(crate) fn fold_years(
    series: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
    reference_year: i32,
) -> ReshapeResult<FoldedYears> {
    if series.is_empty() || series.is_all_null() {
        return Err(ReshapeError::EmptySeries(
            "cannot fold a series without values".to_string(),
        ));
    }

    fold_resampled(&resample(series, freq, agg)?, freq, agg, reference_year)
}

/// Fold a series already resampled at `freq`
pub(crate) fn fold_resampled(
    resampled: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
    reference_year: i32,
) -> ReshapeResult<FoldedYears> {
    let labels = freq.labels_in_year(reference_year);

    // year → reference label → values landing there
    let mut bins: BTreeMap<i32, HashMap<NaiveDate, Vec<f64>>> = BTreeMap::new();
    for (label, value) in resampled.iter() {
        let year_bins = bins.entry(label.year()).or_default();
        let target = reference_date(label, freq, reference_year);
        let (Some(value), Some(target)) = (value, target) else {
            continue;
        };
        year_bins.entry(freq.label(target)).or_default().push(value);
    }

    let years = bins
        .into_iter()
        .map(|(year, year_bins)| {
            let values = labels
                .iter()
                .map(|label| match year_bins.get(label) {
                    Some(values) => agg.apply(values),
                    None => agg.apply(&[]),
                })
                .collect();
            (year, values)
        })
        .collect();

    Ok(FoldedYears { labels, years })
}

/// Fold `series` onto `reference_year`
///
/// The result has one row per `freq` period of the reference year and one
/// column per source year, named by the year and sorted ascending.
pub fn fold_onto(
    series: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
    reference_year: i32,
) -> ReshapeResult<Frame> {
    let folded = fold_years(series, freq, agg, reference_year)?;
    tracing::debug!(
        freq = %freq,
        reference_year,
        rows = folded.labels.len(),
        years = folded.years.len(),
        "Folded series"
    );
    folded.into_frame()
}

/// Fold `series` onto the current calendar year
pub fn fold(series: &TimeSeries, freq: Frequency, agg: Aggregation) -> ReshapeResult<Frame> {
    fold_onto(series, freq, agg, Utc::now().year())
}
