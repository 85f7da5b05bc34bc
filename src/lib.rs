//! # dwchart
//!
//! Reshapes time series into the tables Datawrapper charts expect, and
//! publishes them.
//!
//! ## Features
//!
//! - **Seasonal statistics**: calendar folding and min/max/mean envelopes of
//!   past years, folded or on the real axis
//! - **Overlays**: wide multi-series frames with an optional rescaled
//!   secondary line
//! - **Summary tables**: three-level indented roll-ups with sparklines
//! - **Relative dates**: `(deltamonths (today) -6)` style window bounds
//!
//! ## Modules
//!
//! - [`frame`]: series, frames, resampling and interpolation
//! - [`seasonal`]: folding and seasonal statistics
//! - [`overlay`]: overlay reshaping
//! - [`table`]: hierarchical tables and their styling
//! - [`dates`]: relative-date expressions
//! - [`chart`]: chart payloads, metadata and the publisher
//! - [`client`]: chart service interface and Datawrapper client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dwchart::chart::{ChartContext, ChartDescriptor, Publisher, SeasonalChart};
//! use dwchart::client::{ClientConfig, DatawrapperClient};
//! use dwchart::frame::{Aggregation, Frequency};
//! use dwchart::loader::CsvLoader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let frame = CsvLoader::new().load(Path::new("prices.csv"))?;
//!
//!     let chart = SeasonalChart::new(ChartDescriptor::new("Power prices").with_unit("EUR/MWh"))
//!         .with_frequency(Frequency::Week, Aggregation::Mean)
//!         .folded();
//!
//!     let client = DatawrapperClient::new(ClientConfig {
//!         token: std::env::var("DWCHART_TOKEN")?,
//!         ..ClientConfig::default()
//!     })?;
//!     let publisher = Publisher::new(Arc::new(client), ChartContext::default());
//!     let report = publisher.publish(&chart, &frame).await?;
//!
//!     println!("Published {}", report.chart_id);
//!     Ok(())
//! }
//! ```

pub mod chart;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod frame;
pub mod jobs;
pub mod loader;
pub mod overlay;
pub mod seasonal;
pub mod table;

// Re-export top-level types for convenience
pub use error::{ReshapeError, ReshapeResult};

pub use frame::{
    Aggregation, Cell, DataTable, Frame, Frequency, Interpolation, SeriesKey, TimeSeries,
};

pub use seasonal::{fold, fold_onto, stats_folded, stats_unfolded, SeasonalStatDefinition};

pub use overlay::{overlay, OverlayFrame, OverlayOptions};

pub use table::{build_table, HierarchicalTable, Hierarchy, HierarchyNode, Level};

pub use dates::{evaluate, evaluate_at, evaluate_not_none, DateBound};

pub use chart::{
    ChartContext, ChartDescriptor, ChartPayload, ChartType, OverlayChart, OverlayStyle,
    PublishError, PublishReport, Publisher, RenderedChart, SeasonalChart, TableChart,
};

pub use client::{
    ChartRef, ChartService, ClientConfig, ClientError, DatawrapperClient, InMemoryChartService,
};

pub use config::{Config, ConfigError};

pub use jobs::{ChartJob, ChartKind, JobError, JobFile};

pub use loader::{CsvLoader, LoadError};
