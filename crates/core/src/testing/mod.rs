//! Testing utilities and mock implementations.
//!
//! Mocks for the two seams of the crate: the route server API used by the
//! console, and the route processor used by the server and batch runner.
//!
//! # Example
//!
//! ```rust,ignore
//! use hpcl_core::testing::{MockRouteApi, MockRouteProcessor};
//!
//! let api = MockRouteApi::new();
//! api.script_statuses("r1", vec![RouteStatus::Processing, RouteStatus::Completed]).await;
//!
//! let processor = MockRouteProcessor::new();
//! processor.fail_route("r2", "no geometry").await;
//! ```

mod mock_route_api;
mod mock_route_processor;

pub use mock_route_api::MockRouteApi;
pub use mock_route_processor::MockRouteProcessor;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::route::{NewRoute, Route, RoutePoint, RouteStatus};

    /// A pending route with a short two-point path.
    pub fn route(id: &str, from_code: &str, to_code: &str) -> Route {
        let now = Utc::now();
        Route {
            id: id.to_string(),
            route_name: format!("{}_to_{}", from_code, to_code),
            from_code: from_code.to_string(),
            to_code: to_code.to_string(),
            customer_name: String::new(),
            location: String::new(),
            route_points: sample_points(),
            total_distance_km: 0.0,
            status: RouteStatus::Pending,
            risk: None,
            processing_errors: Vec::new(),
            created_at: now,
            updated_at: now,
            processing_started_at: None,
            processing_completed_at: None,
        }
    }

    /// A pending route with an explicit display name.
    pub fn named_route(id: &str, name: &str, from_code: &str, to_code: &str) -> Route {
        Route {
            route_name: name.to_string(),
            ..route(id, from_code, to_code)
        }
    }

    /// A route in `status`.
    pub fn route_with_status(id: &str, status: RouteStatus) -> Route {
        Route {
            status,
            ..route(id, "1140", "4521")
        }
    }

    /// A creation request with a short two-point path.
    pub fn new_route(from_code: &str, to_code: &str) -> NewRoute {
        NewRoute::new(from_code, to_code).with_points(sample_points())
    }

    /// Two points about 15 km apart near Mumbai.
    pub fn sample_points() -> Vec<RoutePoint> {
        vec![RoutePoint::new(19.0760, 72.8777), RoutePoint::new(19.2183, 72.9781)]
    }
}
