//! Route export downloads.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use hpcl_core::{Route, RouteError, RouteFilter};

use super::handlers::error_response;
use crate::state::AppState;

const CSV_HEADER: [&str; 11] = [
    "id",
    "route_name",
    "from_code",
    "to_code",
    "customer_name",
    "location",
    "status",
    "risk_level",
    "overall_risk",
    "total_distance_km",
    "created_at",
];

/// Query parameters for exports
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// Download all routes as CSV or JSON.
pub async fn export_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> Response {
    let format = params.format.unwrap_or_else(|| "csv".to_string());
    if format != "csv" && format != "json" {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unsupported export format: {}", format),
        )
        .into_response();
    }

    let routes = match all_routes(&state) {
        Ok(routes) => routes,
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    };

    let (content_type, body) = if format == "json" {
        match serde_json::to_vec_pretty(&routes) {
            Ok(bytes) => ("application/json", bytes),
            Err(e) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                    .into_response()
            }
        }
    } else {
        ("text/csv", render_csv(&routes).into_bytes())
    };

    let filename = format!(
        "routes_export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format
    );

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn all_routes(state: &AppState) -> Result<Vec<Route>, RouteError> {
    let store = state.store();
    let total = store.count(&RouteFilter::new())?;
    store.list(&RouteFilter::new().with_limit(total.max(1)))
}

fn render_csv(routes: &[Route]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for route in routes {
        let (risk_level, overall) = match &route.risk {
            Some(risk) => (risk.risk_level.as_str().to_string(), risk.overall.to_string()),
            None => (String::new(), String::new()),
        };
        let fields = [
            route.id.clone(),
            route.route_name.clone(),
            route.from_code.clone(),
            route.to_code.clone(),
            route.customer_name.clone(),
            route.location.clone(),
            route.status.to_string(),
            risk_level,
            overall,
            route.total_distance_km.to_string(),
            route.created_at.to_rfc3339(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field if it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
