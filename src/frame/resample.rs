//! Resampling
//!
//! Groups values by the label of the period they fall into, then aggregates
//! each group. The output covers every period between the first and the last
//! date of the input, so gaps show up as empty bins.
//!
//! ```text
//! dates → label(freq) → bins → aggregate → one value per period
//! ```

use crate::frame::freq::{Aggregation, Frequency};
use crate::frame::types::{Frame, TimeSeries};
use crate::error::ReshapeResult;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Bin non-null values by period label
fn bin(series: &TimeSeries, freq: Frequency) -> HashMap<NaiveDate, Vec<f64>> {
    let mut bins: HashMap<NaiveDate, Vec<f64>> = HashMap::new();
    for (date, value) in series.iter() {
        if let Some(v) = value {
            bins.entry(freq.label(date)).or_default().push(v);
        }
    }
    bins
}

/// Aggregate `series` onto an explicit list of period labels
///
/// Values whose period is not listed are ignored.
pub fn resample_onto(
    series: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
    labels: &[NaiveDate],
) -> Vec<Option<f64>> {
    let bins = bin(series, freq);
    labels
        .iter()
        .map(|label| match bins.get(label) {
            Some(values) => agg.apply(values),
            None => agg.apply(&[]),
        })
        .collect()
}

/// Resample a series at `freq`
pub fn resample(
    series: &TimeSeries,
    freq: Frequency,
    agg: Aggregation,
) -> ReshapeResult<TimeSeries> {
    let (first, last) = match (series.index().first(), series.index().last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(TimeSeries::default()),
    };

    let labels = freq.labels_between(first, last);
    let values = resample_onto(series, freq, agg, &labels);
    TimeSeries::from_points(labels.into_iter().zip(values))
}

/// Resample every column of a frame, choosing the aggregation per column
pub fn resample_frame(
    frame: &Frame,
    freq: Frequency,
    agg_for: impl Fn(&str) -> Aggregation,
) -> ReshapeResult<Frame> {
    let labels = match (frame.index().first(), frame.index().last()) {
        (Some(first), Some(last)) => freq.labels_between(*first, *last),
        _ => Vec::new(),
    };

    let mut resampled = Frame::new(labels.clone())?;
    for column in frame.columns() {
        let series = frame.series(&column.name)?;
        let values = resample_onto(&series, freq, agg_for(&column.name), &labels);
        resampled.push_column(column.name.clone(), values)?;
    }

    tracing::debug!(
        freq = %freq,
        rows_in = frame.len(),
        rows_out = resampled.len(),
        "Resampled frame"
    );

    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate, values: &[f64]) -> TimeSeries {
        TimeSeries::from_values(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_monthly_mean() {
        // 2024-01-30 .. 2024-02-02
        let series = daily(date(2024, 1, 30), &[1.0, 3.0, 10.0, 20.0]);
        let resampled = resample(&series, Frequency::Month, Aggregation::Mean).unwrap();

        assert_eq!(resampled.index(), &[date(2024, 1, 31), date(2024, 2, 29)]);
        assert_eq!(resampled.values(), &[Some(2.0), Some(15.0)]);
    }

    #[test]
    fn test_gaps_become_empty_bins() {
        let series =
            TimeSeries::from_values(vec![(date(2024, 1, 15), 1.0), (date(2024, 4, 15), 4.0)])
                .unwrap();

        let mean = resample(&series, Frequency::Month, Aggregation::Mean).unwrap();
        assert_eq!(mean.values(), &[Some(1.0), None, None, Some(4.0)]);

        let sum = resample(&series, Frequency::Month, Aggregation::Sum).unwrap();
        assert_eq!(sum.values(), &[Some(1.0), Some(0.0), Some(0.0), Some(4.0)]);
    }

    #[test]
    fn test_weekly_bins_close_on_sunday() {
        // Monday 2024-03-11 .. Wednesday 2024-03-20
        let series = daily(date(2024, 3, 11), &[1.0; 10]);
        let resampled = resample(&series, Frequency::Week, Aggregation::Sum).unwrap();

        assert_eq!(resampled.index(), &[date(2024, 3, 17), date(2024, 3, 24)]);
        assert_eq!(resampled.values(), &[Some(7.0), Some(3.0)]);
    }

    #[test]
    fn test_empty_series() {
        let resampled =
            resample(&TimeSeries::default(), Frequency::Day, Aggregation::Mean).unwrap();
        assert!(resampled.is_empty());
    }

    #[test]
    fn test_resample_frame_per_column_aggregation() {
        let frame = Frame::new(vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 2, 1)])
            .unwrap()
            .with_column("flow", vec![Some(1.0), Some(2.0), Some(5.0)])
            .unwrap()
            .with_column("level", vec![Some(1.0), Some(2.0), Some(5.0)])
            .unwrap();

        let resampled = resample_frame(&frame, Frequency::Month, |name| {
            if name == "flow" {
                Aggregation::Sum
            } else {
                Aggregation::Last
            }
        })
        .unwrap();

        assert_eq!(resampled.column("flow").unwrap().values, vec![Some(3.0), Some(5.0)]);
        assert_eq!(resampled.column("level").unwrap().values, vec![Some(2.0), Some(5.0)]);
    }
}
