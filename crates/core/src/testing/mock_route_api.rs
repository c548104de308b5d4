//! Mock route API for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::client::{
    ApiError, ExportFile, ProcessAck, RouteApi, RoutePage, RouteQuery,
    RouteStatusReport, Statistics,
};
use crate::route::{Route, RouteStatus};

/// Mock implementation of the RouteApi trait.
///
/// Provides controllable behavior for testing:
/// - Record when each request was issued (tokio clock, so paused-time tests
///   see exact offsets)
/// - Script the status sequence each route reports
/// - Inject failures and response delays per route
///
/// Routes without a script report `processing` forever. A script is consumed
/// one entry per status request; its last entry repeats.
#[derive(Debug, Default)]
pub struct MockRouteApi {
    process_calls: Arc<RwLock<Vec<(String, Instant)>>>,
    status_calls: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    statistics_calls: Arc<RwLock<Vec<Instant>>>,
    status_scripts: Arc<RwLock<HashMap<String, VecDeque<RouteStatus>>>>,
    status_errors: Arc<RwLock<HashMap<String, Vec<String>>>>,
    status_failures: Arc<RwLock<HashMap<String, ApiError>>>,
    processing_failures: Arc<RwLock<HashMap<String, ApiError>>>,
    processing_delays: Arc<RwLock<HashMap<String, Duration>>>,
    processing_panics: Arc<RwLock<HashSet<String>>>,
    statistics: Arc<RwLock<Statistics>>,
    statistics_failure: Arc<RwLock<Option<ApiError>>>,
    routes: Arc<RwLock<Vec<Route>>>,
}

impl MockRouteApi {
    /// Create a new mock route API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses `route_id` reports on successive status requests.
    pub async fn script_statuses(&self, route_id: &str, statuses: Vec<RouteStatus>) {
        self.status_scripts
            .write()
            .await
            .insert(route_id.to_string(), statuses.into());
    }

    /// Errors included in status reports for `route_id`.
    pub async fn set_status_errors(&self, route_id: &str, errors: Vec<String>) {
        self.status_errors
            .write()
            .await
            .insert(route_id.to_string(), errors);
    }

    /// Make status requests for `route_id` fail.
    pub async fn fail_status(&self, route_id: &str, error: ApiError) {
        self.status_failures
            .write()
            .await
            .insert(route_id.to_string(), error);
    }

    /// Make processing requests for `route_id` fail.
    pub async fn fail_processing(&self, route_id: &str, error: ApiError) {
        self.processing_failures
            .write()
            .await
            .insert(route_id.to_string(), error);
    }

    /// Make processing requests for `route_id` panic instead of answering.
    pub async fn panic_processing(&self, route_id: &str) {
        self.processing_panics
            .write()
            .await
            .insert(route_id.to_string());
    }

    /// Delay the response to processing requests for `route_id`.
    pub async fn set_processing_delay(&self, route_id: &str, delay: Duration) {
        self.processing_delays
            .write()
            .await
            .insert(route_id.to_string(), delay);
    }

    pub async fn set_statistics(&self, statistics: Statistics) {
        *self.statistics.write().await = statistics;
    }

    pub async fn fail_statistics(&self, error: Option<ApiError>) {
        *self.statistics_failure.write().await = error;
    }

    /// Routes served by `list_routes` and exports.
    pub async fn set_routes(&self, routes: Vec<Route>) {
        *self.routes.write().await = routes;
    }

    /// Processing requests in issue order, with the instant each was issued.
    pub async fn process_calls(&self) -> Vec<(String, Instant)> {
        self.process_calls.read().await.clone()
    }

    /// Instants of status requests for `route_id`.
    pub async fn status_calls(&self, route_id: &str) -> Vec<Instant> {
        self.status_calls
            .read()
            .await
            .get(route_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn statistics_calls(&self) -> Vec<Instant> {
        self.statistics_calls.read().await.clone()
    }

    async fn next_status(&self, route_id: &str) -> RouteStatus {
        let mut scripts = self.status_scripts.write().await;
        match scripts.get_mut(route_id) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(RouteStatus::Processing),
            Some(script) => script.front().copied().unwrap_or(RouteStatus::Processing),
            None => RouteStatus::Processing,
        }
    }
}

#[async_trait]
impl RouteApi for MockRouteApi {
    async fn start_processing(&self, route_id: &str) -> Result<ProcessAck, ApiError> {
        self.process_calls
            .write()
            .await
            .push((route_id.to_string(), Instant::now()));

        let delay = self.processing_delays.read().await.get(route_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.processing_panics.read().await.contains(route_id) {
            panic!("processing request for {} panicked", route_id);
        }

        if let Some(error) = self.processing_failures.read().await.get(route_id) {
            return Err(error.clone());
        }
        Ok(ProcessAck::started("Route processing started"))
    }

    async fn route_status(&self, route_id: &str) -> Result<RouteStatusReport, ApiError> {
        self.status_calls
            .write()
            .await
            .entry(route_id.to_string())
            .or_default()
            .push(Instant::now());

        if let Some(error) = self.status_failures.read().await.get(route_id) {
            return Err(error.clone());
        }

        let status = self.next_status(route_id).await;
        let errors = if status == RouteStatus::Failed {
            self.status_errors
                .read()
                .await
                .get(route_id)
                .cloned()
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(RouteStatusReport {
            status,
            progress: match status {
                RouteStatus::Pending => 0,
                RouteStatus::Processing => 50,
                _ => 100,
            },
            errors,
        })
    }

    async fn statistics(&self) -> Result<Statistics, ApiError> {
        self.statistics_calls.write().await.push(Instant::now());

        if let Some(error) = self.statistics_failure.read().await.clone() {
            return Err(error);
        }
        Ok(self.statistics.read().await.clone())
    }

    async fn list_routes(&self, query: &RouteQuery) -> Result<RoutePage, ApiError> {
        let routes = self.routes.read().await;
        let matching: Vec<Route> = routes
            .iter()
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        let per_page = query.per_page.max(1) as usize;
        let start = (query.page.max(1) as usize - 1) * per_page;
        let page_routes = matching.iter().skip(start).take(per_page).cloned().collect();

        Ok(RoutePage {
            routes: page_routes,
            total: matching.len() as u64,
            page: query.page.max(1),
            per_page: query.per_page,
        })
    }

    async fn export_routes(&self, format: &str) -> Result<ExportFile, ApiError> {
        let routes = self.routes.read().await;
        let (content_type, bytes) = match format {
            "json" => (
                "application/json",
                serde_json::to_vec(&*routes).map_err(|e| ApiError::InvalidResponse(e.to_string()))?,
            ),
            "csv" => {
                let mut out = String::from("id,route_name,status\n");
                for route in routes.iter() {
                    out.push_str(&format!("{},{},{}\n", route.id, route.route_name, route.status));
                }
                ("text/csv", out.into_bytes())
            }
            other => {
                return Err(ApiError::Http {
                    status: 400,
                    message: format!("Unsupported export format: {}", other),
                })
            }
        };

        Ok(ExportFile {
            filename: format!("routes_export.{}", format),
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

