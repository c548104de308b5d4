//! Route processing API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use hpcl_core::{process_route as run_processing, ProcessAck, RouteError, RouteStatus, RouteStatusReport};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Start processing a route in the background.
///
/// A terminal route is reset to pending first, so completed and failed
/// routes can be reprocessed.
pub async fn process_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let store = state.store();

    let route = match store.get(&id) {
        Ok(Some(route)) => route,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Route not found").into_response(),
        Err(e) => {
            error!("Route processing error: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    if route.status == RouteStatus::Processing {
        return already_processing();
    }

    if route.status.is_terminal() {
        if let Err(e) = store.reset(&id) {
            return store_error(e);
        }
    }

    if let Err(e) = store.update_status(&id, RouteStatus::Processing, None) {
        return store_error(e);
    }

    let store = Arc::clone(state.store());
    let processor = Arc::clone(state.processor());
    let route_id = id.clone();
    tokio::spawn(async move {
        if let Err(e) = run_processing(store.as_ref(), processor.as_ref(), &route_id).await {
            error!(route_id = %route_id, "Background route processing failed: {}", e);
        }
    });

    info!(route_id = %id, "Route processing started");
    Json(ProcessAck::started("Route processing started")).into_response()
}

/// Get the processing status of a route.
pub async fn route_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RouteStatusReport>, (StatusCode, Json<ErrorResponse>)> {
    match state.store().get(&id) {
        Ok(Some(route)) => Ok(Json(RouteStatusReport {
            status: route.status,
            progress: route.progress(),
            errors: route.processing_errors,
        })),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "Route not found")),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

fn already_processing() -> Response {
    (
        StatusCode::CONFLICT,
        Json(ProcessAck::rejected("Route is already processing")),
    )
        .into_response()
}

fn store_error(e: RouteError) -> Response {
    match e {
        RouteError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Route not found").into_response(),
        RouteError::InvalidTransition {
            from: RouteStatus::Processing,
            ..
        } => already_processing(),
        other => {
            error!("Route processing error: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
        }
    }
}
