//! UI effects of the console, delivered as events to whichever renderer
//! drains the channel.

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::route::{RiskBucket, RouteStatus};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
        }
    }
}

/// Something the console wants shown.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// The process control for a route must not be used.
    ControlDisabled { route_id: String },
    /// The process control for a route is usable again.
    ControlEnabled { route_id: String },
    Notification {
        level: NotificationLevel,
        message: String,
    },
    /// A non-terminal status seen while polling.
    StatusObserved {
        route_id: String,
        status: RouteStatus,
    },
    ProgressShown { total: usize, label: String },
    ProgressUpdated {
        processed: usize,
        total: usize,
        percent: u32,
        label: String,
    },
    ProgressHidden,
    StatsUpdated {
        total: u64,
        processed: u64,
        processing_rate_label: String,
    },
    RiskChartUpdated { distribution: Vec<RiskBucket> },
    /// The route view is stale and should be reloaded.
    RefreshRequested,
}

/// Event with the instant it was emitted.
#[derive(Debug, Clone)]
pub struct ConsoleEventEnvelope {
    pub emitted_at: Instant,
    pub event: ConsoleEvent,
}

/// Handle for emitting console events.
///
/// Cheaply cloneable. A full or closed channel is logged, never fatal to the
/// caller.
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    tx: mpsc::Sender<ConsoleEventEnvelope>,
}

impl ConsoleHandle {
    pub fn new(tx: mpsc::Sender<ConsoleEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity.
    pub async fn emit(&self, event: ConsoleEvent) {
        let envelope = ConsoleEventEnvelope {
            emitted_at: Instant::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit console event: {}", e);
        }
    }

    /// Try to emit an event without waiting.
    ///
    /// Returns true if the event was queued.
    pub fn try_emit(&self, event: ConsoleEvent) -> bool {
        let envelope = ConsoleEventEnvelope {
            emitted_at: Instant::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit console event: {}", e);
                false
            }
        }
    }

    pub async fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(ConsoleEvent::Notification {
            level,
            message: message.into(),
        })
        .await;
    }
}

/// Create a console event channel with room for `buffer` events.
pub fn create_console_channel(buffer: usize) -> (ConsoleHandle, mpsc::Receiver<ConsoleEventEnvelope>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (ConsoleHandle::new(tx), rx)
}
