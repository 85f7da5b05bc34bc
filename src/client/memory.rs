//! In-process chart service
//!
//! Keeps charts in memory and records every call in order. Used by tests and
//! by `--dry-run` publishing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::chart::metadata::merge;
use crate::client::{ChartRef, ChartService, ClientError, ClientResult};

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Create { title: String, chart_type: String },
    Description { id: String, source_name: String },
    Metadata { id: String, metadata: serde_json::Value },
    Data { id: String, csv: String },
    Publish { id: String },
    Delete { id: String },
    Search { title: String },
}

/// Stored state of one chart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredChart {
    pub chart: ChartRef,
    pub source_name: Option<String>,
    pub metadata: serde_json::Value,
    pub csv: Option<String>,
    pub published: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    charts: BTreeMap<String, StoredChart>,
    calls: Vec<ServiceCall>,
}

/// Chart service living in memory
#[derive(Debug, Default)]
pub struct InMemoryChartService {
    state: Mutex<State>,
}

impl InMemoryChartService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, oldest first
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.state.lock().await.calls.clone()
    }

    /// Current state of a chart
    pub async fn chart(&self, id: &str) -> Option<StoredChart> {
        self.state.lock().await.charts.get(id).cloned()
    }

    pub async fn chart_count(&self) -> usize {
        self.state.lock().await.charts.len()
    }
}

fn stored<'a>(state: &'a mut State, id: &str) -> ClientResult<&'a mut StoredChart> {
    state
        .charts
        .get_mut(id)
        .ok_or_else(|| ClientError::ChartNotFound(id.to_string()))
}

#[async_trait]
impl ChartService for InMemoryChartService {
    async fn create_chart(&self, title: &str, chart_type: &str) -> ClientResult<ChartRef> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let chart = ChartRef {
            id: format!("mem{:05}", state.next_id),
            title: title.to_string(),
            chart_type: Some(chart_type.to_string()),
        };
        state.calls.push(ServiceCall::Create {
            title: title.to_string(),
            chart_type: chart_type.to_string(),
        });
        state.charts.insert(
            chart.id.clone(),
            StoredChart {
                chart: chart.clone(),
                metadata: serde_json::json!({}),
                ..StoredChart::default()
            },
        );
        Ok(chart)
    }

    async fn update_description(&self, id: &str, source_name: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Description {
            id: id.to_string(),
            source_name: source_name.to_string(),
        });
        stored(&mut state, id)?.source_name = Some(source_name.to_string());
        Ok(())
    }

    async fn update_metadata(&self, id: &str, metadata: &serde_json::Value) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Metadata {
            id: id.to_string(),
            metadata: metadata.clone(),
        });
        merge(&mut stored(&mut state, id)?.metadata, metadata);
        Ok(())
    }

    async fn add_data(&self, id: &str, csv: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Data {
            id: id.to_string(),
            csv: csv.to_string(),
        });
        stored(&mut state, id)?.csv = Some(csv.to_string());
        Ok(())
    }

    async fn publish(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Publish { id: id.to_string() });
        stored(&mut state, id)?.published = true;
        Ok(())
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Delete { id: id.to_string() });
        state
            .charts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ClientError::ChartNotFound(id.to_string()))
    }

    async fn search(&self, title: &str) -> ClientResult<Vec<ChartRef>> {
        let mut state = self.state.lock().await;
        state.calls.push(ServiceCall::Search {
            title: title.to_string(),
        });
        Ok(state
            .charts
            .values()
            .filter(|stored| stored.chart.title == title)
            .map(|stored| stored.chart.clone())
            .collect())
    }
}
