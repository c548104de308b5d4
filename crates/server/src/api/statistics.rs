use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use hpcl_core::{RouteCounts, RouteFilter, RouteStatus, Statistics};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Dashboard statistics.
pub async fn statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Statistics>, (StatusCode, Json<ErrorResponse>)> {
    let store = state.store();
    let internal = |e: hpcl_core::RouteError| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());

    let count = |status: Option<RouteStatus>| {
        let filter = match status {
            Some(status) => RouteFilter::new().with_status(status),
            None => RouteFilter::new(),
        };
        store.count(&filter).map(|c| c.max(0) as u64)
    };

    let total = count(None).map_err(internal)?;
    let processed = count(Some(RouteStatus::Completed)).map_err(internal)?;
    let pending = count(Some(RouteStatus::Pending)).map_err(internal)?;
    let failed = count(Some(RouteStatus::Failed)).map_err(internal)?;
    let risk_distribution = store.risk_distribution().map_err(internal)?;

    Ok(Json(Statistics {
        routes: RouteCounts::new(total, processed, pending, failed),
        risk_distribution,
    }))
}
