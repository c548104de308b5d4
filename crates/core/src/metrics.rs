//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Route processing (attempts, duration)
//! - Batch sweeps (routes by outcome)
//! - Route API client (requests, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Route Processing Metrics
// =============================================================================

/// Route processing attempts total by result.
pub static PROCESSING_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hpcl_route_processing_attempts_total",
            "Total route processing attempts",
        ),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Route processing duration in seconds.
pub static PROCESSING_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hpcl_route_processing_duration_seconds",
            "Duration of route risk processing",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Routes handled by batch sweeps, by outcome.
pub static BATCH_ROUTES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hpcl_batch_routes_total", "Routes handled by batch sweeps"),
        &["outcome"], // "processed", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// Route API Client Metrics
// =============================================================================

/// Route API requests by endpoint and result.
pub static API_CLIENT_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hpcl_api_client_requests_total",
            "Requests issued by the route API client",
        ),
        &["endpoint", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Route API request latency in seconds.
pub static API_CLIENT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hpcl_api_client_request_duration_seconds",
            "Latency of route API client requests",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Processing
        Box::new(PROCESSING_ATTEMPTS.clone()),
        Box::new(PROCESSING_DURATION.clone()),
        // Batch
        Box::new(BATCH_ROUTES.clone()),
        // API client
        Box::new(API_CLIENT_REQUESTS.clone()),
        Box::new(API_CLIENT_DURATION.clone()),
    ]
}
