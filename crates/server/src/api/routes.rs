use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{export, handlers, middleware::metrics_middleware, processing, route_records, statistics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Processing
        .route("/api/process_route/{id}", post(processing::process_route))
        .route("/api/route_status/{id}", get(processing::route_status))
        // Dashboard
        .route("/api/statistics", get(statistics::statistics))
        // Routes
        .route(
            "/api/routes",
            get(route_records::list_routes).post(route_records::create_route),
        )
        .route("/api/routes/{id}", get(route_records::get_route))
        // Export
        .route("/export/routes", get(export::export_routes))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
