pub mod export;
pub mod handlers;
pub mod middleware;
pub mod processing;
pub mod route_records;
pub mod routes;
pub mod statistics;

pub use routes::create_router;
