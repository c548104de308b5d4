//! Client for the route processing HTTP API.
//!
//! [`RouteApi`] is the seam the console talks through; [`HttpRouteApi`] is the
//! reqwest implementation and `testing::MockRouteApi` the scripted one.

mod http;
mod types;

pub use http::HttpRouteApi;
pub use types::{
    ExportFile, ProcessAck, RouteCounts, RoutePage, RouteQuery, RouteStatusReport, Statistics,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by route API clients.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// Unknown route or resource (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server acknowledged the request but refused it (`success: false`).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The client is misconfigured.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() || err.is_request() {
            ApiError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::ConnectionFailed(err.to_string())
        }
    }
}

/// Operations the console needs from the route server.
#[async_trait]
pub trait RouteApi: Send + Sync {
    /// Ask the server to (re)process a route.
    async fn start_processing(&self, route_id: &str) -> Result<ProcessAck, ApiError>;

    /// Current processing status of a route.
    async fn route_status(&self, route_id: &str) -> Result<RouteStatusReport, ApiError>;

    /// Dashboard statistics.
    async fn statistics(&self) -> Result<Statistics, ApiError>;

    /// One page of routes.
    async fn list_routes(&self, query: &RouteQuery) -> Result<RoutePage, ApiError>;

    /// Download the route export in `format` (passed to the server verbatim).
    async fn export_routes(&self, format: &str) -> Result<ExportFile, ApiError>;
}
