//! Route listing and registration handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use hpcl_core::{NewRoute, Route, RouteFilter, RoutePage, RouteStatus};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Maximum allowed page size
const MAX_PER_PAGE: u32 = 200;

/// Default page size
const DEFAULT_PER_PAGE: u32 = 20;

/// Query parameters for listing routes
#[derive(Debug, Deserialize)]
pub struct ListRoutesParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// List routes, newest first.
pub async fn list_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRoutesParams>,
) -> ApiResult<Json<RoutePage>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let mut filter = RouteFilter::new()
        .with_limit(per_page as i64)
        .with_offset((page as i64 - 1) * per_page as i64);

    if let Some(ref status) = params.status {
        let status = RouteStatus::parse(status).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid status filter: {}", status),
            )
        })?;
        filter = filter.with_status(status);
    }

    let store = state.store();
    let routes = store
        .list(&filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = store
        .count(&filter)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(RoutePage {
        routes,
        total: total.max(0) as u64,
        page,
        per_page,
    }))
}

/// Register a new pending route.
pub async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewRoute>,
) -> ApiResult<(StatusCode, Json<Route>)> {
    if body.from_code.trim().is_empty() || body.to_code.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "from_code and to_code are required",
        ));
    }

    let route = state
        .store()
        .create(body)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(route_id = %route.id, route_name = %route.route_name, "Route created");
    Ok((StatusCode::CREATED, Json(route)))
}

/// Get a route by ID.
pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Route>> {
    match state.store().get(&id) {
        Ok(Some(route)) => Ok(Json(route)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Route not found: {}", id),
        )),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
