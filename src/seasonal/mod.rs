//! Seasonal reshaping
//!
//! - **fold**: project every year of a series onto one reference year
//! - **stats**: min/max/mean envelope of the years before a cutoff, either on
//!   the folded axis or joined back onto the historical axis
//!
//! ```text
//! series → resample → fold → year columns → envelope (years < cutoff)
//!                  └──────→ seasonal position → envelope → left join
//! ```

pub mod fold;
pub mod stats;

pub use fold::{fold, fold_onto, reference_date};
pub use stats::{
    seasonal_envelope, stats_folded, stats_unfolded, Envelope, SeasonalStat,
    SeasonalStatDefinition, StatColumn,
};
