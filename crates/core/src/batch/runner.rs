//! Worker-pool sweep over stored routes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{BatchError, RouteListEntry};
use crate::metrics;
use crate::processing::{process_route, ProcessOutcome, RouteProcessor};
use crate::route::{RouteFilter, RouteStatus, RouteStore};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    peak: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self, success: bool) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        if success {
            self.total_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn to_status(&self, max_workers: usize) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            peak_active: self.peak.load(Ordering::Relaxed) as usize,
            max_workers,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub active_jobs: usize,
    pub peak_active: usize,
    pub max_workers: usize,
    pub total_processed: u64,
    pub total_failed: u64,
}

/// Result of one batch sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl BatchSummary {
    /// Seconds per route over the whole sweep; `None` for an empty sweep.
    pub fn average_secs(&self) -> Option<f64> {
        (self.total > 0).then(|| self.duration.as_secs_f64() / self.total as f64)
    }

    /// Human-readable summary block.
    pub fn render(&self) -> String {
        let rule = "=".repeat(50);
        let average = match self.average_secs() {
            Some(avg) => format!("{:.2} sec/route", avg),
            None => "N/A".to_string(),
        };
        format!(
            "{rule}\nBATCH PROCESSING SUMMARY\n{rule}\nTotal Routes: {}\nProcessed: {}\nSkipped: {}\nFailed: {}\nDuration: {:.1} seconds\nAverage: {}\n{rule}",
            self.total,
            self.processed,
            self.skipped,
            self.failed,
            self.duration.as_secs_f64(),
            average,
        )
    }

    fn log(&self) {
        info!(
            total = self.total,
            processed = self.processed,
            skipped = self.skipped,
            failed = self.failed,
            duration_secs = self.duration.as_secs_f64(),
            "Batch processing finished"
        );
    }
}

/// Processes routes on a fixed number of workers.
pub struct BatchRunner {
    store: Arc<dyn RouteStore>,
    processor: Arc<dyn RouteProcessor>,
    workers: usize,
    stats: Arc<PoolStats>,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn RouteStore>,
        processor: Arc<dyn RouteProcessor>,
        workers: usize,
    ) -> Self {
        Self {
            store,
            processor,
            workers: workers.max(1),
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.stats.to_status(self.workers)
    }

    /// Process every pending route, and failed ones too when `include_failed`.
    pub async fn run_pending(&self, include_failed: bool) -> Result<BatchSummary, BatchError> {
        let started = Instant::now();

        let mut filter = RouteFilter::new().with_status(RouteStatus::Pending);
        if include_failed {
            filter = filter.with_status(RouteStatus::Failed);
        }
        let count = self.store.count(&filter)?;
        let routes = self.store.list(&filter.with_limit(count.max(1)))?;

        let mut route_ids = Vec::with_capacity(routes.len());
        for route in routes {
            if route.status == RouteStatus::Failed {
                self.store.reset(&route.id)?;
            }
            route_ids.push(route.id);
        }

        info!(
            routes = route_ids.len(),
            workers = self.workers,
            include_failed,
            "Starting batch processing of pending routes"
        );

        let (processed, failed) = self.run_pool(route_ids.clone()).await;

        let summary = BatchSummary {
            total: route_ids.len(),
            processed,
            skipped: 0,
            failed,
            duration: started.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    /// Process the routes named in a route list.
    ///
    /// Unknown routes count as failed and completed ones are skipped.
    pub async fn run_route_list(
        &self,
        entries: &[RouteListEntry],
    ) -> Result<BatchSummary, BatchError> {
        let started = Instant::now();
        let mut skipped = 0;
        let mut unknown = 0;
        let mut route_ids = Vec::new();

        for entry in entries {
            let Some(route) = self.store.find_by_codes(&entry.from_code, &entry.to_code)? else {
                warn!(
                    line = entry.line,
                    from_code = %entry.from_code,
                    to_code = %entry.to_code,
                    "Route not found"
                );
                metrics::BATCH_ROUTES.with_label_values(&["failed"]).inc();
                unknown += 1;
                continue;
            };

            match route.status {
                RouteStatus::Completed => {
                    info!(
                        from_code = %entry.from_code,
                        to_code = %entry.to_code,
                        "Skipping existing route"
                    );
                    metrics::BATCH_ROUTES.with_label_values(&["skipped"]).inc();
                    skipped += 1;
                    continue;
                }
                RouteStatus::Failed => {
                    self.store.reset(&route.id)?;
                }
                RouteStatus::Pending | RouteStatus::Processing => {}
            }

            if route_ids.contains(&route.id) {
                debug!(route_id = %route.id, line = entry.line, "Duplicate route-list entry");
                skipped += 1;
                continue;
            }
            route_ids.push(route.id);
        }

        info!(
            entries = entries.len(),
            to_process = route_ids.len(),
            workers = self.workers,
            "Starting batch processing of route list"
        );

        let (processed, failed) = self.run_pool(route_ids).await;

        let summary = BatchSummary {
            total: entries.len(),
            processed,
            skipped,
            failed: failed + unknown,
            duration: started.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    /// Run `route_ids` through the pool. Returns (processed, failed).
    async fn run_pool(&self, route_ids: Vec<String>) -> (usize, usize) {
        let total = route_ids.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for route_id in route_ids {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let store = Arc::clone(&self.store);
            let processor = Arc::clone(&self.processor);
            let stats = Arc::clone(&self.stats);

            tasks.spawn(async move {
                stats.enter();
                let result = process_route(store.as_ref(), processor.as_ref(), &route_id).await;
                let success = matches!(result, Ok(ProcessOutcome::Completed { .. }));
                stats.leave(success);
                drop(permit);

                if let Err(ref e) = result {
                    warn!(route_id = %route_id, error = %e, "Route could not be processed");
                }
                success
            });
        }

        let mut processed = 0;
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {
                    processed += 1;
                    metrics::BATCH_ROUTES.with_label_values(&["processed"]).inc();
                }
                Ok(false) => {
                    failed += 1;
                    metrics::BATCH_ROUTES.with_label_values(&["failed"]).inc();
                }
                Err(e) => {
                    failed += 1;
                    metrics::BATCH_ROUTES.with_label_values(&["failed"]).inc();
                    warn!(error = %e, "Batch worker panicked");
                }
            }

            let done = processed + failed;
            info!(
                "Progress: {:.1}% ({}/{})",
                done as f64 / total as f64 * 100.0,
                done,
                total
            );
        }

        (processed, failed)
    }
}
