//! Gap filling for nullable columns
//!
//! Filling runs forward: interior gaps are always filled, a trailing gap is
//! carried from the last valid value, and a leading gap stays null (except for
//! backfill, which only ever looks ahead).

use crate::error::{ReshapeError, ReshapeResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Interpolation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interpolation {
    /// Straight line between neighbours, rows treated as equally spaced
    Linear,
    /// Straight line between neighbours, weighted by calendar distance
    Time,
    /// Carry the previous valid value forward
    Pad,
    /// Pull the next valid value backward
    Backfill,
    /// Take the closest valid neighbour (previous one on ties)
    Nearest,
}

impl Interpolation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Time => "time",
            Self::Pad => "pad",
            Self::Backfill => "bfill",
            Self::Nearest => "nearest",
        }
    }

    /// Fill the gaps of `values`, indexed by `index`
    pub fn apply(&self, index: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
        let n = values.len();
        let mut prev_valid = vec![None; n];
        let mut next_valid = vec![None; n];

        let mut last = None;
        for i in 0..n {
            if values[i].is_some() {
                last = Some(i);
            }
            prev_valid[i] = last;
        }
        let mut upcoming = None;
        for i in (0..n).rev() {
            if values[i].is_some() {
                upcoming = Some(i);
            }
            next_valid[i] = upcoming;
        }

        (0..n)
            .map(|i| {
                if values[i].is_some() {
                    return values[i];
                }
                let before = prev_valid[i].and_then(|p| values[p].map(|v| (p, v)));
                let after = next_valid[i].and_then(|q| values[q].map(|v| (q, v)));

                match (self, before, after) {
                    (Self::Backfill, _, Some((_, next))) => Some(next),
                    (Self::Backfill, _, None) => None,
                    (_, None, _) => None,
                    (Self::Pad, Some((_, prev)), _) => Some(prev),
                    (_, Some((_, prev)), None) => Some(prev),
                    (Self::Linear, Some((p, prev)), Some((q, next))) => {
                        let weight = (i - p) as f64 / (q - p) as f64;
                        Some(prev + (next - prev) * weight)
                    }
                    (Self::Time, Some((p, prev)), Some((q, next))) => {
                        let span = (index[q] - index[p]).num_days() as f64;
                        let offset = (index[i] - index[p]).num_days() as f64;
                        if span <= 0.0 {
                            Some(prev)
                        } else {
                            Some(prev + (next - prev) * offset / span)
                        }
                    }
                    (Self::Nearest, Some((p, prev)), Some((q, next))) => {
                        if q - i < i - p {
                            Some(next)
                        } else {
                            Some(prev)
                        }
                    }
                }
            })
            .collect()
    }
}

impl FromStr for Interpolation {
    type Err = ReshapeError;

    fn from_str(s: &str) -> ReshapeResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "time" => Ok(Self::Time),
            "pad" | "ffill" => Ok(Self::Pad),
            "bfill" | "backfill" => Ok(Self::Backfill),
            "nearest" => Ok(Self::Nearest),
            _ => Err(ReshapeError::UnknownInterpolation(s.to_string())),
        }
    }
}

impl TryFrom<String> for Interpolation {
    type Error = ReshapeError;

    fn try_from(value: String) -> ReshapeResult<Self> {
        value.parse()
    }
}

impl From<Interpolation> for String {
    fn from(method: Interpolation) -> Self {
        method.name().to_string()
    }
}
