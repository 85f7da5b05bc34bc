//! Chart publishing
//!
//! Sequences the chart service calls for one payload:
//!
//! ```text
//! render ─ search(title) ─ delete(matches) ─ create ─ data ─ description ─ metadata ─ publish
//! ```
//!
//! Rendering happens before the first call, so a reshape failure never leaves
//! a half-built chart behind. Calls are made once each, in order.

use crate::chart::{ChartContext, ChartPayload, RenderedChart};
use crate::client::{ChartService, ClientError};
use crate::error::ReshapeError;
use crate::frame::Frame;
use std::sync::Arc;
use thiserror::Error;

/// Publishing errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Reshape error: {0}")]
    Reshape(#[from] ReshapeError),

    #[error("Chart service error: {0}")]
    Client(#[from] ClientError),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Outcome of one publish or data update
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub chart_id: String,
    pub title: String,
    /// Charts with the same title removed beforehand
    pub replaced: usize,
    /// Data rows uploaded
    pub rows: usize,
    pub duration_ms: u64,
}

/// Publishes chart payloads through a [`ChartService`]
pub struct Publisher<S: ChartService> {
    service: Arc<S>,
    context: ChartContext,
}

impl<S: ChartService> Publisher<S> {
    pub fn new(service: Arc<S>, context: ChartContext) -> Self {
        Self { service, context }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn context(&self) -> &ChartContext {
        &self.context
    }

    /// Render without touching the service
    pub fn preview(&self, chart: &dyn ChartPayload, frame: &Frame) -> PublishResult<RenderedChart> {
        Ok(chart.render(frame, &self.context)?)
    }

    /// Replace any chart titled like `chart` with a freshly published one
    pub async fn publish(
        &self,
        chart: &dyn ChartPayload,
        frame: &Frame,
    ) -> PublishResult<PublishReport> {
        let start = std::time::Instant::now();
        let descriptor = chart.descriptor();
        let rendered = chart.render(frame, &self.context)?;
        let csv = rendered.to_csv()?;

        let existing = self.service.search(&descriptor.title).await?;
        for old in &existing {
            tracing::debug!(id = %old.id, title = %descriptor.title, "Deleting previous chart");
            self.service.delete(&old.id).await?;
        }

        let created = self
            .service
            .create_chart(&descriptor.title, chart.chart_type().id())
            .await?;
        self.service.add_data(&created.id, &csv).await?;
        self.service
            .update_description(&created.id, &descriptor.source)
            .await?;
        self.service
            .update_metadata(&created.id, &rendered.metadata)
            .await?;
        self.service.publish(&created.id).await?;

        let report = PublishReport {
            chart_id: created.id,
            title: descriptor.title.clone(),
            replaced: existing.len(),
            rows: rendered.table.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            id = %report.chart_id,
            title = %report.title,
            chart_type = %chart.chart_type(),
            replaced = report.replaced,
            rows = report.rows,
            duration_ms = report.duration_ms,
            "Published chart"
        );
        Ok(report)
    }

    /// Re-render `frame` and upload it to the first chart titled like `chart`
    ///
    /// Metadata and description are left as they are.
    pub async fn update_data(
        &self,
        chart: &dyn ChartPayload,
        frame: &Frame,
    ) -> PublishResult<PublishReport> {
        let start = std::time::Instant::now();
        let title = &chart.descriptor().title;
        let rendered = chart.render(frame, &self.context)?;
        let csv = rendered.to_csv()?;

        let target = self
            .service
            .search(title)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::ChartNotFound(title.clone()))?;

        self.service.add_data(&target.id, &csv).await?;
        self.service.publish(&target.id).await?;

        let report = PublishReport {
            chart_id: target.id,
            title: title.clone(),
            replaced: 0,
            rows: rendered.table.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            id = %report.chart_id,
            title = %report.title,
            rows = report.rows,
            "Updated chart data"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartDescriptor, OverlayChart, OverlayStyle};
    use crate::client::{InMemoryChartService, ServiceCall};
    use crate::overlay::OverlayOptions;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(vec![date(2024, 1, 1), date(2024, 1, 2)])
            .unwrap()
            .with_column("power", vec![Some(1.0), Some(2.0)])
            .unwrap()
    }

    fn chart() -> OverlayChart {
        OverlayChart::new(
            ChartDescriptor::new("Power").with_source("ENTSO-E").with_unit("MW"),
            OverlayStyle::Lines,
        )
    }

    fn publisher() -> Publisher<InMemoryChartService> {
        Publisher::new(
            Arc::new(InMemoryChartService::new()),
            ChartContext::default().with_today(date(2024, 1, 2)),
        )
    }

    #[tokio::test]
    async fn test_publish_call_order() {
        let publisher = publisher();
        let report = publisher.publish(&chart(), &frame()).await.unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.replaced, 0);

        let calls = publisher.service().calls().await;
        let id = report.chart_id.clone();
        assert_eq!(calls[0], ServiceCall::Search { title: "Power".into() });
        assert_eq!(
            calls[1],
            ServiceCall::Create {
                title: "Power".into(),
                chart_type: "d3-lines".into()
            }
        );
        assert!(matches!(
            &calls[2],
            ServiceCall::Data { id: i, csv } if *i == id && csv.starts_with("date,power")
        ));
        assert_eq!(
            calls[3],
            ServiceCall::Description {
                id: id.clone(),
                source_name: "ENTSO-E".into()
            }
        );
        assert!(matches!(&calls[4], ServiceCall::Metadata { .. }));
        assert_eq!(calls[5], ServiceCall::Publish { id: id.clone() });

        let stored = publisher.service().chart(&id).await.unwrap();
        assert!(stored.published);
        assert_eq!(
            stored.metadata["data"]["column-format"]["power"]["number-append"],
            serde_json::json!(" MW")
        );
    }

    #[tokio::test]
    async fn test_publish_replaces_same_title() {
        let publisher = publisher();
        let first = publisher.publish(&chart(), &frame()).await.unwrap();
        let second = publisher.publish(&chart(), &frame()).await.unwrap();

        assert_eq!(second.replaced, 1);
        assert_ne!(first.chart_id, second.chart_id);
        assert_eq!(publisher.service().chart_count().await, 1);
        assert!(publisher.service().chart(&first.chart_id).await.is_none());
    }

    #[tokio::test]
    async fn test_reshape_failure_makes_no_call() {
        let publisher = publisher();
        let secondary = chart().with_options(OverlayOptions::new().with_secondary(true));

        let result = publisher.publish(&secondary, &frame()).await;

        assert!(matches!(
            result,
            Err(PublishError::Reshape(ReshapeError::SecondaryAxisArityError(1)))
        ));
        assert!(publisher.service().calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_data() {
        let publisher = publisher();
        assert!(matches!(
            publisher.update_data(&chart(), &frame()).await,
            Err(PublishError::Client(ClientError::ChartNotFound(_)))
        ));

        let published = publisher.publish(&chart(), &frame()).await.unwrap();
        let longer = Frame::new(vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)])
            .unwrap()
            .with_column("power", vec![Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();
        let updated = publisher.update_data(&chart(), &longer).await.unwrap();

        assert_eq!(updated.chart_id, published.chart_id);
        assert_eq!(updated.rows, 3);
        let stored = publisher.service().chart(&updated.chart_id).await.unwrap();
        assert_eq!(stored.csv.unwrap().lines().count(), 4);
    }

    #[test]
    fn test_preview_is_offline() {
        let publisher = publisher();
        let rendered = publisher.preview(&chart(), &frame()).unwrap();
        assert_eq!(rendered.table.columns, vec!["date", "power"]);
    }
}
