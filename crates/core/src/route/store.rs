//! Route storage trait and types.

use thiserror::Error;

use super::{NewRoute, RiskBucket, RiskSummary, Route, RouteStatus};

/// Error type for route store operations.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Route not found.
    #[error("Route not found: {0}")]
    NotFound(String),

    /// The requested status change is not allowed from the current status.
    #[error("Cannot move route {route_id} from {from} to {to}")]
    InvalidTransition {
        route_id: String,
        from: RouteStatus,
        to: RouteStatus,
    },

    /// The datastore could not be opened or answered no query.
    #[error("Datastore unreachable: {0}")]
    Unreachable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying routes.
#[derive(Debug, Clone)]
pub struct RouteFilter {
    /// Only routes in one of these statuses (empty = any status).
    pub statuses: Vec<RouteStatus>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for RouteFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            statuses: Vec::new(),
            limit: 100,
            offset: 0,
        }
    }

    /// Add a status to the filter.
    pub fn with_status(mut self, status: RouteStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for route storage backends.
pub trait RouteStore: Send + Sync {
    /// Register a new route in `pending` status.
    fn create(&self, route: NewRoute) -> Result<Route, RouteError>;

    /// Get a route by ID.
    fn get(&self, id: &str) -> Result<Option<Route>, RouteError>;

    /// Find a route by origin and destination codes.
    fn find_by_codes(&self, from_code: &str, to_code: &str) -> Result<Option<Route>, RouteError>;

    /// List routes matching the filter, newest first.
    fn list(&self, filter: &RouteFilter) -> Result<Vec<Route>, RouteError>;

    /// Count routes matching the filter (limit and offset are ignored).
    fn count(&self, filter: &RouteFilter) -> Result<i64, RouteError>;

    /// Move a route to a new status.
    ///
    /// Only transitions allowed by [`RouteStatus::can_transition_to`] succeed.
    /// An error message given with `failed` is appended to the route's
    /// processing errors.
    fn update_status(
        &self,
        id: &str,
        status: RouteStatus,
        error: Option<String>,
    ) -> Result<Route, RouteError>;

    /// Put a terminal route back to `pending`, clearing previous results.
    ///
    /// A pending route is returned unchanged; a processing route is rejected.
    fn reset(&self, id: &str) -> Result<Route, RouteError>;

    /// Store the outcome of risk processing.
    fn record_risk(
        &self,
        id: &str,
        risk: RiskSummary,
        total_distance_km: f64,
    ) -> Result<Route, RouteError>;

    /// Count completed routes per risk level.
    fn risk_distribution(&self) -> Result<Vec<RiskBucket>, RouteError>;

    /// Check that the datastore answers queries.
    fn ping(&self) -> Result<(), RouteError>;
}
