//! Status polling for a single route.
//!
//! One request per period, the first one period after start, until the route
//! reaches a terminal status. At most one loop runs per route ID; the
//! [`PollRegistry`] enforces that.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::events::{ConsoleEvent, ConsoleHandle, NotificationLevel};
use crate::client::RouteApi;
use crate::route::RouteStatus;

/// Error type for starting a poller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    /// A loop for this route is already running.
    #[error("Route {0} is already being polled")]
    AlreadyPolling(String),
}

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed,
    /// The route failed, or its status could not be fetched.
    Failed { errors: Vec<String> },
    /// The configured poll limit was reached before a terminal status.
    GaveUp { polls: u32 },
}

/// Route IDs with an active polling loop.
#[derive(Debug, Clone, Default)]
pub struct PollRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `route_id`. `None` if it is already claimed.
    pub fn try_acquire(&self, route_id: &str) -> Option<PollGuard> {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(route_id.to_string()) {
            return None;
        }
        Some(PollGuard {
            registry: self.clone(),
            route_id: route_id.to_string(),
        })
    }

    pub fn is_active(&self, route_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(route_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn release(&self, route_id: &str) {
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(route_id);
    }
}

/// Releases the route's registry entry on drop.
#[derive(Debug)]
pub struct PollGuard {
    registry: PollRegistry,
    route_id: String,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.registry.release(&self.route_id);
    }
}

/// Polls route status until a terminal state.
#[derive(Clone)]
pub struct StatusPoller {
    api: Arc<dyn RouteApi>,
    handle: ConsoleHandle,
    registry: PollRegistry,
    period: Duration,
    max_polls: Option<u32>,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn RouteApi>,
        handle: ConsoleHandle,
        registry: PollRegistry,
        period: Duration,
    ) -> Self {
        Self {
            api,
            handle,
            registry,
            period,
            max_polls: None,
        }
    }

    /// Stop after `max_polls` requests without a terminal status.
    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Start a background loop for `route_id`.
    pub fn start(&self, route_id: &str) -> Result<JoinHandle<PollOutcome>, PollerError> {
        let guard = self
            .registry
            .try_acquire(route_id)
            .ok_or_else(|| PollerError::AlreadyPolling(route_id.to_string()))?;

        let poller = self.clone();
        let route_id = route_id.to_string();
        Ok(tokio::spawn(async move {
            let outcome = poller.poll_loop(&route_id).await;
            drop(guard);
            outcome
        }))
    }

    /// Poll `route_id` on the current task until it ends.
    pub async fn run(&self, route_id: &str) -> Result<PollOutcome, PollerError> {
        let _guard = self
            .registry
            .try_acquire(route_id)
            .ok_or_else(|| PollerError::AlreadyPolling(route_id.to_string()))?;
        Ok(self.poll_loop(route_id).await)
    }

    async fn poll_loop(&self, route_id: &str) -> PollOutcome {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(route_id, period_ms = self.period.as_millis() as u64, "Status polling started");

        let mut polls: u32 = 0;
        let outcome = loop {
            if let Some(max) = self.max_polls {
                if polls >= max {
                    warn!(route_id, polls, "Giving up on route status");
                    self.handle
                        .notify(
                            NotificationLevel::Warning,
                            format!("Stopped waiting for route {} after {} checks", route_id, polls),
                        )
                        .await;
                    break PollOutcome::GaveUp { polls };
                }
            }

            interval.tick().await;
            polls += 1;

            match self.api.route_status(route_id).await {
                Ok(report) => match report.status {
                    RouteStatus::Completed => {
                        self.handle
                            .notify(NotificationLevel::Success, "Route processing completed")
                            .await;
                        self.handle.emit(ConsoleEvent::RefreshRequested).await;
                        break PollOutcome::Completed;
                    }
                    RouteStatus::Failed => {
                        self.report_failure(&report.errors).await;
                        break PollOutcome::Failed {
                            errors: report.errors,
                        };
                    }
                    status => {
                        debug!(route_id, %status, polls, "Route not finished yet");
                        self.handle
                            .emit(ConsoleEvent::StatusObserved {
                                route_id: route_id.to_string(),
                                status,
                            })
                            .await;
                    }
                },
                Err(e) => {
                    warn!(route_id, error = %e, "Status check failed");
                    let errors = vec![e.to_string()];
                    self.report_failure(&errors).await;
                    break PollOutcome::Failed { errors };
                }
            }
        };

        info!(route_id, polls, outcome = ?outcome, "Status polling stopped");
        outcome
    }

    async fn report_failure(&self, errors: &[String]) {
        let message = if errors.is_empty() {
            "Route processing failed".to_string()
        } else {
            format!("Route processing failed: {}", errors.join("; "))
        };
        self.handle.notify(NotificationLevel::Danger, message).await;
        self.handle.emit(ConsoleEvent::RefreshRequested).await;
    }
}
