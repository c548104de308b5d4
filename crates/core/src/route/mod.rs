//! Routes and their processing status.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRouteStore;
pub use store::{RouteError, RouteFilter, RouteStore};
pub use types::{
    NewRoute, RiskBucket, RiskLevel, RiskSummary, Route, RoutePoint, RouteStatus,
};
