//! Overlay reshaping
//!
//! Aligns several named series into one wide frame for line, area and bar
//! charts. With a secondary axis, the second column is rescaled onto the
//! range of the first so both lines share one y axis:
//!
//! ```text
//! rescaled = 0.90 * mean1 + std1 * (col2 - mean2) / std2
//! ```
//!
//! The original values of the second column are kept for label annotation.

use crate::error::{ReshapeError, ReshapeResult};
use crate::frame::{DataTable, Frame, Interpolation};
use chrono::NaiveDate;

/// Overlay reshaping options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayOptions {
    pub interpolation: Option<Interpolation>,
    pub secondary: bool,
    /// Inclusive lower bound of the rendered window
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound of the rendered window
    pub end: Option<NaiveDate>,
}

impl OverlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpolation(mut self, method: Interpolation) -> Self {
        self.interpolation = Some(method);
        self
    }

    pub fn with_secondary(mut self, secondary: bool) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Reshaped overlay frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    /// Windowed frame, second column rescaled when a secondary axis is used
    pub frame: Frame,
    /// Original values of the secondary column, aligned with `frame` rows
    pub unscaled: Option<Vec<Option<f64>>>,
}

/// Point of the secondary line picked for a value annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryLabel {
    pub date: NaiveDate,
    /// Position on the shared axis
    pub rescaled: f64,
    /// Value printed in the label
    pub unscaled: f64,
}

impl OverlayFrame {
    pub fn is_secondary(&self) -> bool {
        self.unscaled.is_some()
    }

    /// Time axis first, then value columns in their original order
    pub fn to_data_table(&self, index_label: &str) -> DataTable {
        self.frame.to_data_table(index_label)
    }

    /// Last point of each of the first `chunks - 1` equal chunks of the secondary line
    ///
    /// Chunks follow an even split where the leading chunks take the
    /// remainder. Points whose value is null are skipped.
    pub fn secondary_labels(&self, chunks: usize) -> Vec<SecondaryLabel> {
        let (Some(unscaled), Some(column)) = (&self.unscaled, self.frame.columns().last()) else {
            return Vec::new();
        };
        let n = self.frame.len();
        if chunks == 0 || n == 0 {
            return Vec::new();
        }

        let base = n / chunks;
        let extra = n % chunks;
        let mut end = 0;
        let mut labels = Vec::new();
        for chunk in 0..chunks.saturating_sub(1) {
            let size = base + usize::from(chunk < extra);
            if size == 0 {
                continue;
            }
            end += size;
            let row = end - 1;
            if let (Some(rescaled), Some(original)) = (column.values[row], unscaled[row]) {
                labels.push(SecondaryLabel {
                    date: self.frame.index()[row],
                    rescaled,
                    unscaled: original,
                });
            }
        }
        labels
    }
}

/// Skip-null mean and sample standard deviation (n - 1)
fn moments(values: &[Option<f64>]) -> (Option<f64>, Option<f64>) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let n = present.len();
    if n == 0 {
        return (None, None);
    }
    let mean = present.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (Some(mean), None);
    }
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (Some(mean), Some(variance.sqrt()))
}

/// Reshape `frame` for an overlay chart
pub fn overlay(frame: &Frame, options: &OverlayOptions) -> ReshapeResult<OverlayFrame> {
    let mut reshaped = match options.interpolation {
        Some(method) => frame.interpolate(method),
        None => frame.clone(),
    };

    let mut unscaled = None;
    if options.secondary {
        if reshaped.width() != 2 {
            return Err(ReshapeError::SecondaryAxisArityError(reshaped.width()));
        }
        let primary = &reshaped.columns()[0];
        let secondary = &reshaped.columns()[1];

        let (mean1, std1) = moments(&primary.values);
        let mean1 = mean1.ok_or_else(|| ReshapeError::EmptySeries(primary.name.clone()))?;
        let std1 = std1.unwrap_or(0.0);
        let (mean2, std2) = match moments(&secondary.values) {
            (Some(mean), Some(std)) if std > 0.0 && std.is_finite() => (mean, std),
            _ => return Err(ReshapeError::DegenerateSecondary(secondary.name.clone())),
        };

        let original = secondary.values.clone();
        let rescaled = original
            .iter()
            .map(|v| v.map(|v| 0.90 * mean1 + std1 * ((v - mean2) / std2)))
            .collect();
        if let Some(column) = reshaped.column_mut(1) {
            column.values = rescaled;
        }

        tracing::debug!(mean1, std1, mean2, std2, "Rescaled secondary column");
        unscaled = Some((reshaped.index().to_vec(), original));
    }

    let windowed = reshaped.slice(options.start, options.end);
    let unscaled = unscaled.map(|(index, values)| {
        index
            .into_iter()
            .zip(values)
            .filter(|(date, _)| {
                options.start.map_or(true, |s| *date >= s)
                    && options.end.map_or(true, |e| *date <= e)
            })
            .map(|(_, v)| v)
            .collect()
    });

    tracing::debug!(
        columns = windowed.width(),
        rows = windowed.len(),
        secondary = options.secondary,
        "Reshaped overlay frame"
    );

    Ok(OverlayFrame {
        frame: windowed,
        unscaled,
    })
}
