//! Single-route processing trigger.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{ConsoleEvent, NotificationLevel};
use super::poller::{PollOutcome, PollerError};
use super::Console;

/// Result of triggering processing for one route.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The server accepted the request. `poller` is `None` when the route
    /// was already being polled.
    Started {
        poller: Option<JoinHandle<PollOutcome>>,
    },
    /// The request failed; the control was re-enabled.
    Failed(String),
}

impl TriggerOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, TriggerOutcome::Started { .. })
    }

    /// Wait for the poller, if any.
    pub async fn wait(self) -> Option<PollOutcome> {
        match self {
            TriggerOutcome::Started {
                poller: Some(handle),
            } => handle.await.ok(),
            _ => None,
        }
    }
}

impl Console {
    /// Ask the server to process `route_id` and follow it to a terminal status.
    pub async fn process_route(&self, route_id: &str) -> TriggerOutcome {
        let handle = self.handle();
        handle
            .emit(ConsoleEvent::ControlDisabled {
                route_id: route_id.to_string(),
            })
            .await;

        match self.api().start_processing(route_id).await {
            Ok(ack) => {
                let message = ack
                    .message
                    .unwrap_or_else(|| "Route processing started".to_string());
                info!(route_id, "Route processing started");
                handle.notify(NotificationLevel::Success, message).await;

                match self.poller().start(route_id) {
                    Ok(poller) => TriggerOutcome::Started {
                        poller: Some(poller),
                    },
                    Err(PollerError::AlreadyPolling(_)) => {
                        debug!(route_id, "Route already being polled");
                        TriggerOutcome::Started { poller: None }
                    }
                }
            }
            Err(e) => {
                warn!(route_id, error = %e, "Route processing request failed");
                handle
                    .emit(ConsoleEvent::ControlEnabled {
                        route_id: route_id.to_string(),
                    })
                    .await;
                let reason = e.to_string();
                handle
                    .notify(
                        NotificationLevel::Danger,
                        format!("Error processing route: {}", reason),
                    )
                    .await;
                TriggerOutcome::Failed(reason)
            }
        }
    }
}
