//! Route risk processing.
//!
//! A [`RouteProcessor`] turns the geometry of a route into a [`RiskSummary`].
//! [`process_route`] drives one route through its status lifecycle around a
//! processor call:
//!
//! ```text
//! pending -> processing -> completed   (assessment stored)
//!                       \-> failed     (error appended to the route)
//! ```
//!
//! Processor failures are outcomes, not errors: the route ends in `failed`
//! and the caller gets [`ProcessOutcome::Failed`]. Only store problems and
//! illegal starting states surface as [`ProcessError`].

mod geometry;

pub use geometry::GeometryProcessor;

use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::route::{RiskSummary, Route, RouteError, RouteStatus, RouteStore};

/// Error type for route processing.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The route has no coordinates to assess.
    #[error("Route {0} has no route points")]
    NoRoutePoints(String),

    /// The processor could not assess the route.
    #[error("Processing failed: {0}")]
    Processor(String),

    /// The route cannot be processed from its current status.
    #[error("Route {route_id} is {status} and cannot be processed")]
    NotProcessable { route_id: String, status: RouteStatus },

    /// Route store error.
    #[error(transparent)]
    Store(#[from] RouteError),
}

/// What a processor produces for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAssessment {
    pub risk: RiskSummary,
    pub total_distance_km: f64,
}

/// Final state of one processing run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Completed {
        route_id: String,
        assessment: RouteAssessment,
    },
    Failed {
        route_id: String,
        error: String,
    },
}

impl ProcessOutcome {
    pub fn route_id(&self) -> &str {
        match self {
            ProcessOutcome::Completed { route_id, .. } | ProcessOutcome::Failed { route_id, .. } => {
                route_id
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProcessOutcome::Completed { .. })
    }
}

/// Assesses the risk of a route.
#[async_trait]
pub trait RouteProcessor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Assess one route.
    async fn assess(&self, route: &Route) -> Result<RouteAssessment, ProcessError>;
}

/// Run `processor` on the route with `route_id` and record the result.
///
/// A pending route is moved to `processing` first; a route already in
/// `processing` (claimed by the caller) is processed as is.
pub async fn process_route(
    store: &dyn RouteStore,
    processor: &dyn RouteProcessor,
    route_id: &str,
) -> Result<ProcessOutcome, ProcessError> {
    let route = store
        .get(route_id)?
        .ok_or_else(|| RouteError::NotFound(route_id.to_string()))?;

    let route = match route.status {
        RouteStatus::Pending => store.update_status(route_id, RouteStatus::Processing, None)?,
        RouteStatus::Processing => route,
        status => {
            return Err(ProcessError::NotProcessable {
                route_id: route_id.to_string(),
                status,
            })
        }
    };

    info!(
        route_id = %route.id,
        route_name = %route.route_name,
        processor = processor.name(),
        "Processing route"
    );

    let started = Instant::now();
    let result = processor.assess(&route).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(assessment) => {
            store.record_risk(route_id, assessment.risk.clone(), assessment.total_distance_km)?;
            store.update_status(route_id, RouteStatus::Completed, None)?;

            metrics::PROCESSING_ATTEMPTS
                .with_label_values(&["completed"])
                .inc();
            metrics::PROCESSING_DURATION
                .with_label_values(&["completed"])
                .observe(elapsed);

            info!(
                route_id = %route_id,
                risk_level = assessment.risk.risk_level.as_str(),
                overall = assessment.risk.overall,
                distance_km = assessment.total_distance_km,
                "Route processing completed"
            );

            Ok(ProcessOutcome::Completed {
                route_id: route_id.to_string(),
                assessment,
            })
        }
        Err(err @ ProcessError::Store(_)) => Err(err),
        Err(err) => {
            let message = err.to_string();
            store.update_status(route_id, RouteStatus::Failed, Some(message.clone()))?;

            metrics::PROCESSING_ATTEMPTS
                .with_label_values(&["failed"])
                .inc();
            metrics::PROCESSING_DURATION
                .with_label_values(&["failed"])
                .observe(elapsed);

            warn!(route_id = %route_id, error = %message, "Route processing failed");
            debug!(route_id = %route_id, elapsed_secs = elapsed, "Failed run duration");

            Ok(ProcessOutcome::Failed {
                route_id: route_id.to_string(),
                error: message,
            })
        }
    }
}
