//! reqwest implementation of [`RouteApi`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ApiError, ExportFile, ProcessAck, RouteApi, RoutePage, RouteQuery, RouteStatusReport,
    Statistics,
};
use crate::metrics;

/// Route API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRouteApi {
    client: Client,
    base_url: String,
}

impl HttpRouteApi {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route_url(&self, prefix: &str, route_id: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            prefix,
            urlencoding::encode(route_id)
        )
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response, ApiError> {
        let started = Instant::now();
        let result = request.send().await;
        metrics::API_CLIENT_DURATION
            .with_label_values(&[endpoint])
            .observe(started.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(response) => check_status(response).await,
            Err(e) => Err(ApiError::from(e)),
        };

        let label = if outcome.is_ok() { "success" } else { "error" };
        metrics::API_CLIENT_REQUESTS
            .with_label_values(&[endpoint, label])
            .inc();

        if let Err(ref e) = outcome {
            debug!(endpoint, error = %e, "Route API request failed");
        }
        outcome
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} response: {}", endpoint, e)))
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(message));
    }
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Extract `error` (or `message`) from a JSON error body, or the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Filename from a `Content-Disposition` header value.
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let name = part.strip_prefix("filename=")?;
        let name = name.trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[async_trait]
impl RouteApi for HttpRouteApi {
    async fn start_processing(&self, route_id: &str) -> Result<ProcessAck, ApiError> {
        let url = self.route_url("process_route", route_id);
        debug!(route_id, "Requesting route processing");

        let ack: ProcessAck = self
            .get_json("process_route", self.client.post(&url))
            .await?;

        if !ack.success {
            let reason = ack
                .error
                .clone()
                .or_else(|| ack.message.clone())
                .unwrap_or_else(|| "server reported failure".to_string());
            return Err(ApiError::Rejected(reason));
        }
        Ok(ack)
    }

    async fn route_status(&self, route_id: &str) -> Result<RouteStatusReport, ApiError> {
        let url = self.route_url("route_status", route_id);
        self.get_json("route_status", self.client.get(&url)).await
    }

    async fn statistics(&self) -> Result<Statistics, ApiError> {
        let url = format!("{}/api/statistics", self.base_url);
        self.get_json("statistics", self.client.get(&url)).await
    }

    async fn list_routes(&self, query: &RouteQuery) -> Result<RoutePage, ApiError> {
        let url = format!("{}/api/routes", self.base_url);

        let mut params = vec![
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }

        self.get_json("list_routes", self.client.get(&url).query(&params))
            .await
    }

    async fn export_routes(&self, format: &str) -> Result<ExportFile, ApiError> {
        let url = format!("{}/export/routes", self.base_url);
        let response = self
            .send("export_routes", self.client.get(&url).query(&[("format", format)]))
            .await?;

        let headers = response.headers();
        let filename = headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| format!("routes_export.{}", format));
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?
            .to_vec();

        Ok(ExportFile {
            filename,
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteStatus;
    use axum::extract::Path;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/api/process_route/{id}",
                post(|Path(id): Path<String>| async move {
                    match id.as_str() {
                        "missing" => (
                            StatusCode::NOT_FOUND,
                            Json(json!({"error": "Route not found"})),
                        ),
                        "busy" => (
                            StatusCode::CONFLICT,
                            Json(json!({"success": false, "error": "Route is already processing"})),
                        ),
                        "refused" => (StatusCode::OK, Json(json!({"success": false, "error": "nope"}))),
                        _ => (
                            StatusCode::OK,
                            Json(json!({"success": true, "message": "Route processing started"})),
                        ),
                    }
                }),
            )
            .route(
                "/api/route_status/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"status": "failed", "progress": 100, "errors": [format!("bad {}", id)]}))
                }),
            )
            .route(
                "/api/statistics",
                get(|| async {
                    Json(json!({
                        "routes": {"total": 10, "processed": 4, "processing_rate": 40.0, "pending": 5, "failed": 1},
                        "risk_distribution": [{"risk_level": "HIGH", "count": 4}]
                    }))
                }),
            )
            .route(
                "/export/routes",
                get(|| async {
                    (
                        [
                            (header::CONTENT_TYPE, "text/csv"),
                            (
                                header::CONTENT_DISPOSITION,
                                "attachment; filename=\"routes_export_20260101.csv\"",
                            ),
                        ],
                        "id,route_name\n",
                    )
                        .into_response()
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> HttpRouteApi {
        HttpRouteApi::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            HttpRouteApi::new("  ", Duration::from_secs(1)),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = client("http://localhost:5000/");
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(
            api.route_url("route_status", "a b"),
            "http://localhost:5000/api/route_status/a%20b"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": "Route not found"}"#).as_deref(),
            Some("Route not found")
        );
        assert_eq!(error_message("boom").as_deref(), Some("boom"));
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=\"a.csv\"").as_deref(),
            Some("a.csv")
        );
        assert_eq!(disposition_filename("inline"), None);
    }

    #[tokio::test]
    async fn test_start_processing_success() {
        let api = client(&spawn_server().await);
        let ack = api.start_processing("r1").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.message.as_deref(), Some("Route processing started"));
    }

    #[tokio::test]
    async fn test_start_processing_errors() {
        let api = client(&spawn_server().await);

        assert_eq!(
            api.start_processing("missing").await,
            Err(ApiError::NotFound("Route not found".to_string()))
        );
        assert_eq!(
            api.start_processing("busy").await,
            Err(ApiError::Http {
                status: 409,
                message: "Route is already processing".to_string()
            })
        );
        assert_eq!(
            api.start_processing("refused").await,
            Err(ApiError::Rejected("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_route_status() {
        let api = client(&spawn_server().await);
        let report = api.route_status("r9").await.unwrap();
        assert_eq!(report.status, RouteStatus::Failed);
        assert_eq!(report.errors, vec!["bad r9".to_string()]);
    }

    #[tokio::test]
    async fn test_statistics() {
        let api = client(&spawn_server().await);
        let stats = api.statistics().await.unwrap();
        assert_eq!(stats.routes.total, 10);
        assert_eq!(stats.routes.processing_rate_label(), "40.0%");
        assert_eq!(stats.risk_distribution[0].count, 4);
    }

    #[tokio::test]
    async fn test_export_routes() {
        let api = client(&spawn_server().await);
        let file = api.export_routes("csv").await.unwrap();
        assert_eq!(file.filename, "routes_export_20260101.csv");
        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.bytes, b"id,route_name\n".to_vec());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr));
        assert!(matches!(
            api.statistics().await,
            Err(ApiError::ConnectionFailed(_))
        ));
    }
}
