//! Progress of a bulk session.

use std::time::Duration;

use super::events::{ConsoleEvent, ConsoleHandle};

/// Processed/total counter of one bulk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub total: usize,
    pub processed: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
        }
    }

    /// Count one completion. Saturates at `total`.
    pub fn tick(&mut self) {
        if self.processed < self.total {
            self.processed += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    /// Rounded percentage, 0 for an empty session.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.processed as f64 * 100.0 / self.total as f64).round() as u32
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.processed, self.total)
    }
}

/// Shows, advances and hides the progress widget.
pub struct ProgressReporter {
    handle: ConsoleHandle,
    close_delay: Duration,
    state: ProgressState,
}

impl ProgressReporter {
    /// Show the widget at `0/total`.
    pub async fn start(handle: ConsoleHandle, total: usize, close_delay: Duration) -> Self {
        let state = ProgressState::new(total);
        handle
            .emit(ConsoleEvent::ProgressShown {
                total,
                label: state.label(),
            })
            .await;
        Self {
            handle,
            close_delay,
            state,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Record one completion and publish the new value.
    pub async fn tick(&mut self) -> ProgressState {
        self.state.tick();
        self.handle
            .emit(ConsoleEvent::ProgressUpdated {
                processed: self.state.processed,
                total: self.state.total,
                percent: self.state.percent(),
                label: self.state.label(),
            })
            .await;
        self.state
    }

    /// Hide the widget after the closing delay.
    pub async fn finish(self) {
        tokio::time::sleep(self.close_delay).await;
        self.handle.emit(ConsoleEvent::ProgressHidden).await;
    }
}
