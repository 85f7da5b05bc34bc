//! Frame primitives
//!
//! - **types**: `TimeSeries`, `Frame`, `SeriesKey`
//! - **freq**: resampling periods and aggregations
//! - **resample**: period binning
//! - **interpolate**: gap filling
//! - **payload**: `DataTable`, the CSV payload sent to the chart service

pub mod freq;
pub mod interpolate;
pub mod payload;
pub mod resample;
pub mod types;

pub use freq::{Aggregation, Frequency};
pub use interpolate::Interpolation;
pub use payload::{Cell, DataTable};
pub use resample::{resample, resample_frame, resample_onto};
pub use types::{Column, Frame, SeriesKey, TimeSeries};

impl Frame {
    /// Fill the gaps of every column with `method`
    pub fn interpolate(&self, method: Interpolation) -> Frame {
        let mut filled = self.clone();
        let index = self.index().to_vec();
        for position in 0..filled.width() {
            if let Some(column) = filled.column_mut(position) {
                column.values = method.apply(&index, &column.values);
            }
        }
        filled
    }
}
