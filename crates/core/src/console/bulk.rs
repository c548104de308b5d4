//! Bulk processing of a selection of routes.
//!
//! Requests are staggered by `index * stagger` so the server sees them in
//! selection order; completions are counted in arrival order.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::events::{ConsoleEvent, ConsoleHandle, NotificationLevel};
use super::progress::ProgressReporter;
use crate::client::{ApiError, ProcessAck, RouteApi};

/// Error type for bulk processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    #[error("Please select at least one route to process")]
    EmptySelection,
}

/// Tally of one bulk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

struct Completion {
    route_id: String,
    result: Result<ProcessAck, ApiError>,
}

/// Issues staggered processing requests for several routes.
#[derive(Clone)]
pub struct BulkOrchestrator {
    api: Arc<dyn RouteApi>,
    handle: ConsoleHandle,
    stagger: Duration,
    close_delay: Duration,
}

impl BulkOrchestrator {
    pub fn new(
        api: Arc<dyn RouteApi>,
        handle: ConsoleHandle,
        stagger: Duration,
        close_delay: Duration,
    ) -> Self {
        Self {
            api,
            handle,
            stagger,
            close_delay,
        }
    }

    /// Process `route_ids` and wait until every request has completed.
    pub async fn run(&self, route_ids: &[String]) -> Result<BulkSummary, BulkError> {
        if route_ids.is_empty() {
            self.handle
                .notify(NotificationLevel::Warning, BulkError::EmptySelection.to_string())
                .await;
            return Err(BulkError::EmptySelection);
        }

        let total = route_ids.len();
        info!(total, stagger_ms = self.stagger.as_millis() as u64, "Bulk processing started");

        let mut reporter =
            ProgressReporter::start(self.handle.clone(), total, self.close_delay).await;

        let (tx, mut rx) = mpsc::channel::<Completion>(total);
        let mut tasks = JoinSet::new();
        for (index, route_id) in route_ids.iter().enumerate() {
            let api = Arc::clone(&self.api);
            let tx = tx.clone();
            let route_id = route_id.clone();
            let delay = self.stagger * index as u32;

            tasks.spawn(async move {
                tokio::time::sleep(delay).await;
                let result = api.start_processing(&route_id).await;
                let _ = tx.send(Completion { route_id, result }).await;
            });
        }
        drop(tx);

        let mut summary = BulkSummary {
            total,
            ..Default::default()
        };

        while let Some(completion) = rx.recv().await {
            match completion.result {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(route_id = %completion.route_id, error = %e, "Bulk processing request failed");
                }
            }
            if reporter.tick().await.is_complete() {
                break;
            }
        }

        let accounted = summary.succeeded + summary.failed;
        if accounted < total {
            let missing = total - accounted;
            warn!(missing, "Bulk requests ended without a result");
            summary.failed += missing;
            for _ in 0..missing {
                reporter.tick().await;
            }
        }

        reporter.finish().await;
        self.handle.emit(ConsoleEvent::RefreshRequested).await;

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk processing finished"
        );
        Ok(summary)
    }
}
