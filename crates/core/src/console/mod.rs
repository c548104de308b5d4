//! Route console: client-side orchestration of route processing.
//!
//! The console talks to the route server through a [`RouteApi`] and reports
//! every UI effect as a [`ConsoleEvent`] on a channel:
//!
//! - [`Console::process_route`]: trigger one route and poll it to completion
//! - [`Console::process_routes`]: staggered bulk trigger with progress
//! - [`DashboardRefresher`]: periodic statistics refresh
//!
//! # Example
//!
//! ```rust,ignore
//! use hpcl_core::console::{create_console_channel, Console};
//!
//! let (handle, mut events) = create_console_channel(config.console.event_buffer);
//! let console = Console::new(api, config.console.clone(), handle);
//!
//! let outcome = console.process_route("route-id").await;
//! while let Some(envelope) = events.recv().await {
//!     println!("{:?}", envelope.event);
//! }
//! ```

mod bulk;
mod dashboard;
mod events;
mod filter;
mod poller;
mod progress;
mod trigger;

pub use bulk::{BulkError, BulkOrchestrator, BulkSummary};
pub use dashboard::DashboardRefresher;
pub use events::{
    create_console_channel, ConsoleEvent, ConsoleEventEnvelope, ConsoleHandle, NotificationLevel,
};
pub use filter::filter_routes;
pub use poller::{PollGuard, PollOutcome, PollRegistry, PollerError, StatusPoller};
pub use progress::{ProgressReporter, ProgressState};
pub use trigger::TriggerOutcome;

use std::sync::Arc;

use crate::client::{ApiError, RouteApi, RoutePage, RouteQuery};
use crate::config::ConsoleConfig;

/// One console session.
pub struct Console {
    api: Arc<dyn RouteApi>,
    config: ConsoleConfig,
    handle: ConsoleHandle,
    registry: PollRegistry,
}

impl Console {
    pub fn new(api: Arc<dyn RouteApi>, config: ConsoleConfig, handle: ConsoleHandle) -> Self {
        Self {
            api,
            config,
            handle,
            registry: PollRegistry::new(),
        }
    }

    pub fn api(&self) -> &Arc<dyn RouteApi> {
        &self.api
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn handle(&self) -> &ConsoleHandle {
        &self.handle
    }

    pub fn registry(&self) -> &PollRegistry {
        &self.registry
    }

    /// Status poller sharing this session's registry.
    pub fn poller(&self) -> StatusPoller {
        StatusPoller::new(
            Arc::clone(&self.api),
            self.handle.clone(),
            self.registry.clone(),
            self.config.status_poll_interval(),
        )
        .with_max_polls(self.config.max_status_polls)
    }

    pub fn bulk(&self) -> BulkOrchestrator {
        BulkOrchestrator::new(
            Arc::clone(&self.api),
            self.handle.clone(),
            self.config.bulk_stagger(),
            self.config.progress_close_delay(),
        )
    }

    pub fn dashboard(&self) -> DashboardRefresher {
        DashboardRefresher::new(
            Arc::clone(&self.api),
            self.handle.clone(),
            self.config.dashboard_refresh_interval(),
            self.config.risk_chart,
        )
    }

    /// Bulk-process `route_ids`.
    pub async fn process_routes(&self, route_ids: &[String]) -> Result<BulkSummary, BulkError> {
        self.bulk().run(route_ids).await
    }

    /// Fetch a page of routes, keeping only those matching `filter`.
    pub async fn routes(&self, query: &RouteQuery, filter: Option<&str>) -> Result<RoutePage, ApiError> {
        let mut page = self.api.list_routes(query).await?;
        if let Some(needle) = filter {
            page.routes.retain(|route| route.matches(needle));
        }
        Ok(page)
    }
}
