//! Periodic dashboard statistics refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::events::{ConsoleEvent, ConsoleHandle};
use crate::client::{RouteApi, Statistics};

/// Refreshes statistics widgets on a fixed interval.
pub struct DashboardRefresher {
    api: Arc<dyn RouteApi>,
    handle: ConsoleHandle,
    interval: Duration,
    risk_chart: bool,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DashboardRefresher {
    pub fn new(
        api: Arc<dyn RouteApi>,
        handle: ConsoleHandle,
        interval: Duration,
        risk_chart: bool,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            api,
            handle,
            interval,
            risk_chart,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Fetch statistics once and publish them.
    ///
    /// Returns the statistics, or `None` when the fetch failed (logged at
    /// debug, nothing emitted).
    pub async fn refresh_once(&self) -> Option<Statistics> {
        Self::refresh(&self.api, &self.handle, self.risk_chart).await
    }

    async fn refresh(
        api: &Arc<dyn RouteApi>,
        handle: &ConsoleHandle,
        risk_chart: bool,
    ) -> Option<Statistics> {
        let stats = match api.statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                debug!(error = %e, "Dashboard statistics fetch failed");
                return None;
            }
        };

        handle
            .emit(ConsoleEvent::StatsUpdated {
                total: stats.routes.total,
                processed: stats.routes.processed,
                processing_rate_label: stats.routes.processing_rate_label(),
            })
            .await;

        if risk_chart {
            handle
                .emit(ConsoleEvent::RiskChartUpdated {
                    distribution: stats.risk_distribution.clone(),
                })
                .await;
        }

        Some(stats)
    }

    /// Start the refresh loop. The first refresh happens one interval after start.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Dashboard refresher already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let api = Arc::clone(&self.api);
        let handle = self.handle.clone();
        let risk_chart = self.risk_chart;
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(interval_ms = period.as_millis() as u64, "Dashboard refresh loop started");
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Dashboard refresh loop received shutdown signal");
                        break;
                    }
                    _ = interval.tick() => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::refresh(&api, &handle, risk_chart).await;
                    }
                }
            }
            info!("Dashboard refresh loop stopped");
        });
    }

    /// Stop the refresh loop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Dashboard refresher not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, RouteCounts};
    use crate::console::events::create_console_channel;
    use crate::route::{RiskBucket, RiskLevel};
    use crate::testing::MockRouteApi;

    fn stats() -> Statistics {
        Statistics {
            routes: RouteCounts {
                total: 50,
                processed: 21,
                processing_rate: 42.0,
                pending: 29,
                failed: 0,
            },
            risk_distribution: vec![RiskBucket {
                risk_level: RiskLevel::Medium,
                count: 21,
            }],
        }
    }

    #[tokio::test]
    async fn test_refresh_once_formats_rate() {
        let api = Arc::new(MockRouteApi::new());
        api.set_statistics(stats()).await;
        let (handle, mut rx) = create_console_channel(16);
        let refresher = DashboardRefresher::new(api, handle, Duration::from_secs(30), false);

        assert!(refresher.refresh_once().await.is_some());

        assert_eq!(
            rx.recv().await.unwrap().event,
            ConsoleEvent::StatsUpdated {
                total: 50,
                processed: 21,
                processing_rate_label: "42.0%".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_risk_chart_when_enabled() {
        let api = Arc::new(MockRouteApi::new());
        api.set_statistics(stats()).await;
        let (handle, mut rx) = create_console_channel(16);
        let refresher = DashboardRefresher::new(api, handle, Duration::from_secs(30), true);

        refresher.refresh_once().await;

        rx.recv().await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap().event,
            ConsoleEvent::RiskChartUpdated { ref distribution } if distribution.len() == 1
        ));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let api = Arc::new(MockRouteApi::new());
        api.fail_statistics(Some(ApiError::ConnectionFailed("refused".to_string())))
            .await;
        let (handle, mut rx) = create_console_channel(16);
        let refresher = DashboardRefresher::new(api, handle, Duration::from_secs(30), true);

        assert!(refresher.refresh_once().await.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_refreshes_every_interval_until_stopped() {
        let api = Arc::new(MockRouteApi::new());
        api.set_statistics(stats()).await;
        let (handle, _rx) = create_console_channel(64);
        let refresher =
            DashboardRefresher::new(api.clone(), handle, Duration::from_secs(30), false);

        refresher.start();
        assert!(refresher.is_running());

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(api.statistics_calls().await.len(), 3);

        refresher.stop();
        assert!(!refresher.is_running());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.statistics_calls().await.len(), 3);
    }
}
