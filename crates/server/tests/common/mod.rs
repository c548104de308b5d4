//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router on top of a temporary SQLite store and
//! a controllable [`MockRouteProcessor`], so endpoint tests need no running
//! server.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hpcl_core::testing::MockRouteProcessor;
use hpcl_core::{
    Config, DatabaseConfig, NewRoute, Route, RouteProcessor, RouteStatus, RouteStore,
    SqliteRouteStore,
};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use hpcl_core::testing::fixtures;

/// Test fixture wrapping the API router.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Route store shared with the router
    pub store: Arc<SqliteRouteStore>,
    /// Mock processor - control assessments and failures
    pub processor: Arc<MockRouteProcessor>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Config::default()
        };

        let store = Arc::new(SqliteRouteStore::new(&db_path).expect("Failed to create route store"));
        let processor = Arc::new(MockRouteProcessor::new());

        let state = Arc::new(hpcl_server::state::AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn RouteStore>,
            Arc::clone(&processor) as Arc<dyn RouteProcessor>,
        ));

        let router = hpcl_server::api::create_router(state);

        Self {
            router,
            store,
            processor,
            temp_dir,
        }
    }

    /// Register a pending route directly in the store.
    pub fn create_route(&self, from_code: &str, to_code: &str) -> Route {
        self.store
            .create(NewRoute::new(from_code, to_code).with_points(fixtures::sample_points()))
            .expect("Failed to create route")
    }

    /// Wait until background processing leaves the route in `status`.
    pub async fn wait_for_status(&self, id: &str, status: RouteStatus) -> Route {
        for _ in 0..100 {
            let route = self
                .store
                .get(id)
                .expect("Failed to read route")
                .expect("Route disappeared");
            if route.status == status {
                return route;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Route {} never reached status {}", id, status);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw: body_bytes.to_vec(),
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
