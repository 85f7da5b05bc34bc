//! Resampling periods and aggregation functions
//!
//! A [`Frequency`] decides which bin a date falls into and how that bin is
//! labelled. Labels follow the period-end convention: a day is its own label,
//! a week is labelled by the Sunday that closes it, months, quarters and years
//! by their last day.

use crate::error::{ReshapeError, ReshapeResult};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Resampling period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Calendar day
    Day,
    /// Monday to Sunday week, labelled by its Sunday
    Week,
    /// Calendar month
    Month,
    /// Calendar quarter
    Quarter,
    /// Calendar year
    Year,
}

impl Frequency {
    /// All supported frequencies, finest first
    pub fn all() -> &'static [Frequency] {
        &[
            Frequency::Day,
            Frequency::Week,
            Frequency::Month,
            Frequency::Quarter,
            Frequency::Year,
        ]
    }

    /// Short period code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
            Self::Quarter => "Q",
            Self::Year => "A",
        }
    }

    /// Label of the period containing `date`
    pub fn label(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            Self::Month => month_end(date),
            Self::Quarter => {
                let quarter_last_month = ((date.month() - 1) / 3) * 3 + 3;
                NaiveDate::from_ymd_opt(date.year(), quarter_last_month, 1)
                    .map(month_end)
                    .unwrap_or(date)
            }
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
        }
    }

    /// Label of the period following the one labelled `label`
    pub fn next_label(&self, label: NaiveDate) -> NaiveDate {
        // Labels are period ends, so the next day opens the next period
        self.label(label.succ_opt().unwrap_or(label))
    }

    /// Every label from the period of `first` to the period of `last`, inclusive
    pub fn labels_between(&self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        let end = self.label(last);
        let mut current = self.label(first);
        let mut labels = Vec::new();

        while current <= end {
            labels.push(current);
            let next = self.next_label(current);
            if next == current {
                break;
            }
            current = next;
        }

        labels
    }

    /// Every label of the periods that intersect calendar year `year`
    pub fn labels_in_year(&self, year: i32) -> Vec<NaiveDate> {
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(first), Some(last)) => self.labels_between(first, last),
            _ => Vec::new(),
        }
    }

    /// Position of `date` within its seasonal cycle
    ///
    /// Day-of-year for daily data, ISO week for weekly, month, quarter, and a
    /// single constant position for yearly data.
    pub fn seasonal_position(&self, date: NaiveDate) -> u32 {
        match self {
            Self::Day => date.ordinal(),
            Self::Week => date.iso_week().week(),
            Self::Month => date.month(),
            Self::Quarter => quarter_of(date),
            Self::Year => 1,
        }
    }

    /// Human readable period label (`05 May`, `May '24`, `Q2 '24`, `2024`)
    pub fn pretty_label(&self, date: NaiveDate) -> String {
        match self {
            Self::Day | Self::Week => date.format("%d %b").to_string(),
            Self::Month => date.format("%b '%y").to_string(),
            Self::Quarter => format!("Q{} '{}", quarter_of(date), date.format("%y")),
            Self::Year => date.format("%Y").to_string(),
        }
    }

    /// Compact period label for sparkline columns (`-05M05`, `24W12`, `24M5`)
    pub fn sparkline_label(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("-%dM%m").to_string(),
            Self::Week => date.format("%yW%V").to_string(),
            Self::Month => date.format("%yM%-m").to_string(),
            Self::Quarter => format!("{}Q{}", date.format("%y"), quarter_of(date)),
            Self::Year => date.format("%y").to_string(),
        }
    }
}

impl FromStr for Frequency {
    type Err = ReshapeError;

    fn from_str(s: &str) -> ReshapeResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Self::Day),
            "w" | "week" | "weekly" => Ok(Self::Week),
            "m" | "month" | "monthly" => Ok(Self::Month),
            "q" | "quarter" | "quarterly" => Ok(Self::Quarter),
            "a" | "y" | "year" | "yearly" | "annual" => Ok(Self::Year),
            _ => Err(ReshapeError::InvalidFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = ReshapeError;

    fn try_from(value: String) -> ReshapeResult<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.code().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// Last day of the month containing `date`
pub(crate) fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Aggregation applied to the values falling into one bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Aggregation {
    Min,
    Max,
    Mean,
    Sum,
    First,
    Last,
    Median,
    Count,
}

impl Aggregation {
    /// Apply the aggregation to the non-null values of a bin
    ///
    /// Empty bins give `None`, except `Sum` and `Count` which give zero.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return match self {
                Self::Sum | Self::Count => Some(0.0),
                _ => None,
            };
        }

        Some(match self {
            Self::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::First => *values.first()?,
            Self::Last => *values.last()?,
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let n = sorted.len();
                if n % 2 == 1 {
                    sorted[n / 2]
                } else {
                    (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
                }
            }
            Self::Count => values.len() as f64,
        })
    }

    /// Apply the aggregation to nullable cells, skipping nulls
    pub fn apply_nullable(&self, values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        self.apply(&present)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::First => "first",
            Self::Last => "last",
            Self::Median => "median",
            Self::Count => "count",
        }
    }
}

impl FromStr for Aggregation {
    type Err = ReshapeError;

    fn from_str(s: &str) -> ReshapeResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "median" => Ok(Self::Median),
            "count" => Ok(Self::Count),
            _ => Err(ReshapeError::UnknownAggregation(s.to_string())),
        }
    }
}

impl TryFrom<String> for Aggregation {
    type Error = ReshapeError;

    fn try_from(value: String) -> ReshapeResult<Self> {
        value.parse()
    }
}

impl From<Aggregation> for String {
    fn from(agg: Aggregation) -> Self {
        agg.name().to_string()
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Day);
        assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Week);
        assert_eq!("m".parse::<Frequency>().unwrap(), Frequency::Month);
        assert_eq!("Q".parse::<Frequency>().unwrap(), Frequency::Quarter);
        assert_eq!("A".parse::<Frequency>().unwrap(), Frequency::Year);
        assert!(matches!(
            "fortnight".parse::<Frequency>(),
            Err(ReshapeError::InvalidFrequency(_))
        ));
    }

    #[test]
    fn test_every_frequency_labels_consistently() {
        for freq in Frequency::all() {
            assert_eq!(freq.code().parse::<Frequency>().unwrap(), *freq);

            let labels = freq.labels_in_year(2024);
            assert!(!labels.is_empty(), "{} has no labels", freq.code());
            for pair in labels.windows(2) {
                assert!(pair[0] < pair[1], "{} labels not increasing", freq.code());
                assert_eq!(freq.next_label(pair[0]), pair[1]);
            }
            for label in &labels {
                assert_eq!(freq.label(*label), *label, "{} label not a period end", freq.code());
                assert!(!freq.pretty_label(*label).is_empty());
                assert!(!freq.sparkline_label(*label).is_empty());
            }
        }
    }

    #[test]
    fn test_week_label_is_closing_sunday() {
        // 2024-03-13 is a Wednesday
        assert_eq!(Frequency::Week.label(date(2024, 3, 13)), date(2024, 3, 17));
        // A Sunday is its own label
        assert_eq!(Frequency::Week.label(date(2024, 3, 17)), date(2024, 3, 17));
    }

    #[test]
    fn test_period_end_labels() {
        assert_eq!(Frequency::Month.label(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(Frequency::Month.label(date(2023, 2, 10)), date(2023, 2, 28));
        assert_eq!(Frequency::Quarter.label(date(2024, 5, 1)), date(2024, 6, 30));
        assert_eq!(Frequency::Year.label(date(2024, 5, 1)), date(2024, 12, 31));
    }

    #[test]
    fn test_labels_in_year() {
        assert_eq!(Frequency::Day.labels_in_year(2023).len(), 365);
        assert_eq!(Frequency::Day.labels_in_year(2024).len(), 366);
        assert_eq!(Frequency::Month.labels_in_year(2024).len(), 12);
        assert_eq!(Frequency::Quarter.labels_in_year(2024).len(), 4);
        assert_eq!(Frequency::Year.labels_in_year(2024), vec![date(2024, 12, 31)]);

        // 2023-01-01 is a Sunday: it closes its own week, then 52 more follow
        assert_eq!(Frequency::Week.labels_in_year(2023).len(), 53);
    }

    #[test]
    fn test_seasonal_position() {
        assert_eq!(Frequency::Day.seasonal_position(date(2024, 2, 1)), 32);
        assert_eq!(Frequency::Month.seasonal_position(date(2024, 2, 1)), 2);
        assert_eq!(Frequency::Quarter.seasonal_position(date(2024, 11, 1)), 4);
        assert_eq!(Frequency::Year.seasonal_position(date(2024, 11, 1)), 1);
    }

    #[test]
    fn test_pretty_and_sparkline_labels() {
        let d = date(2024, 5, 5);
        assert_eq!(Frequency::Day.pretty_label(d), "05 May");
        assert_eq!(Frequency::Day.sparkline_label(d), "-05M05");

        assert_eq!(Frequency::Week.sparkline_label(date(2024, 3, 24)), "24W12");

        let m = date(2024, 5, 31);
        assert_eq!(Frequency::Month.pretty_label(m), "May '24");
        assert_eq!(Frequency::Month.sparkline_label(m), "24M5");

        let q = date(2024, 6, 30);
        assert_eq!(Frequency::Quarter.pretty_label(q), "Q2 '24");
        assert_eq!(Frequency::Quarter.sparkline_label(q), "24Q2");

        let y = date(2024, 12, 31);
        assert_eq!(Frequency::Year.pretty_label(y), "2024");
        assert_eq!(Frequency::Year.sparkline_label(y), "24");
    }

    #[test]
    fn test_aggregation_functions() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(Aggregation::Mean.apply(&values), Some(3.0));
        assert_eq!(Aggregation::Sum.apply(&values), Some(15.0));
        assert_eq!(Aggregation::Min.apply(&values), Some(1.0));
        assert_eq!(Aggregation::Max.apply(&values), Some(5.0));
        assert_eq!(Aggregation::First.apply(&values), Some(1.0));
        assert_eq!(Aggregation::Last.apply(&values), Some(5.0));
        assert_eq!(Aggregation::Median.apply(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(Aggregation::Count.apply(&values), Some(5.0));

        // Empty bins
        let empty: Vec<f64> = vec![];
        assert_eq!(Aggregation::Mean.apply(&empty), None);
        assert_eq!(Aggregation::Sum.apply(&empty), Some(0.0));
    }

    #[test]
    fn test_apply_nullable_skips_nulls() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(Aggregation::Mean.apply_nullable(&values), Some(2.0));
        assert_eq!(Aggregation::First.apply_nullable(&[None, Some(7.0)]), Some(7.0));
    }

    #[test]
    fn test_aggregation_deserialize() {
        let agg: Aggregation = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(agg, Aggregation::Mean);
        assert!(serde_json::from_str::<Aggregation>("\"mode\"").is_err());
    }
}
