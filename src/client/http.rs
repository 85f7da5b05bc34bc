//! Datawrapper REST API client
//!
//! ```text
//! POST   /v3/charts               create
//! PATCH  /v3/charts/{id}          description, metadata
//! PUT    /v3/charts/{id}/data     CSV upload
//! POST   /v3/charts/{id}/publish
//! DELETE /v3/charts/{id}
//! GET    /v3/charts?search=...
//! ```
//!
//! Requests are sent once; failures are reported to the caller as is.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::chart::metadata::source_block;
use crate::client::{ChartRef, ChartService, ClientConfig, ClientError, ClientResult};

/// Datawrapper API v3 client
pub struct DatawrapperClient {
    client: Client,
    config: ClientConfig,
}

impl DatawrapperClient {
    /// Create a client with the given configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v3/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Attach auth and send, mapping transport failures
    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout
                } else if e.is_connect() {
                    ClientError::Unavailable
                } else {
                    ClientError::Request(e)
                }
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::ApiError {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn patch_metadata(&self, id: &str, metadata: serde_json::Value) -> ClientResult<()> {
        let url = self.url(&format!("charts/{}", id));
        let body = PatchChartRequest { metadata };
        self.send(self.client.patch(&url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl ChartService for DatawrapperClient {
    async fn create_chart(&self, title: &str, chart_type: &str) -> ClientResult<ChartRef> {
        let url = self.url("charts");
        let body = CreateChartRequest {
            title: title.to_string(),
            chart_type: chart_type.to_string(),
        };

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let chart: ChartRef = response.json().await?;
        tracing::debug!(id = %chart.id, title, chart_type, "Created chart");
        Ok(chart)
    }

    async fn update_description(&self, id: &str, source_name: &str) -> ClientResult<()> {
        self.patch_metadata(id, source_block(source_name)).await
    }

    async fn update_metadata(&self, id: &str, metadata: &serde_json::Value) -> ClientResult<()> {
        self.patch_metadata(id, metadata.clone()).await
    }

    async fn add_data(&self, id: &str, csv: &str) -> ClientResult<()> {
        let url = self.url(&format!("charts/{}/data", id));
        let request = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(csv.to_string());
        self.send(request).await?;
        Ok(())
    }

    async fn publish(&self, id: &str) -> ClientResult<()> {
        let url = self.url(&format!("charts/{}/publish", id));
        self.send(self.client.post(&url)).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        let url = self.url(&format!("charts/{}", id));
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn search(&self, title: &str) -> ClientResult<Vec<ChartRef>> {
        let url = self.url("charts");
        let request = self.client.get(&url).query(&[("search", title)]);
        let response = self.send(request).await?;
        let text = response.text().await?;
        parse_search(&text)
    }
}

/// Decode a chart listing, either `{"list": [...]}` or a bare array
fn parse_search(body: &str) -> ClientResult<Vec<ChartRef>> {
    let listing: SearchResponse =
        serde_json::from_str(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    Ok(match listing {
        SearchResponse::Paged { list } => list,
        SearchResponse::Bare(list) => list,
    })
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct CreateChartRequest {
    title: String,
    #[serde(rename = "type")]
    chart_type: String,
}

#[derive(Debug, Serialize)]
struct PatchChartRequest {
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Paged {
        #[serde(default)]
        list: Vec<ChartRef>,
    },
    Bare(Vec<ChartRef>),
}
