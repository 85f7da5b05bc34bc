//! Chart service client
//!
//! The charting service is reached through the narrow [`ChartService`]
//! interface:
//!
//! - **http**: Datawrapper API v3 over reqwest
//! - **memory**: in-process service recording every call, for tests and dry runs

mod http;
mod memory;

pub use http::DatawrapperClient;
pub use memory::{InMemoryChartService, ServiceCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A chart known to the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub chart_type: Option<String>,
}

/// Operations the publishing pipeline needs from a charting service
#[async_trait]
pub trait ChartService: Send + Sync {
    /// Create an empty chart
    async fn create_chart(&self, title: &str, chart_type: &str) -> ClientResult<ChartRef>;

    /// Set the source line shown under the chart
    async fn update_description(&self, id: &str, source_name: &str) -> ClientResult<()>;

    /// Merge `metadata` into the chart's metadata
    async fn update_metadata(&self, id: &str, metadata: &serde_json::Value) -> ClientResult<()>;

    /// Replace the chart's data with a CSV payload
    async fn add_data(&self, id: &str, csv: &str) -> ClientResult<()>;

    async fn publish(&self, id: &str) -> ClientResult<()>;

    async fn delete(&self, id: &str) -> ClientResult<()>;

    /// Charts whose title matches `title`
    async fn search(&self, title: &str) -> ClientResult<Vec<ChartRef>>;
}

/// Connection settings of the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://api.datawrapper.de")
    pub base_url: String,
    /// Bearer token
    pub token: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.datawrapper.de".to_string(),
            token: String::new(),
            request_timeout_ms: 30000,
        }
    }
}

/// Errors raised while talking to the chart service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Chart service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Chart not found: {0}")]
    ChartNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
