pub mod batch;
pub mod client;
pub mod config;
pub mod console;
pub mod metrics;
pub mod processing;
pub mod route;
pub mod testing;

pub use batch::{
    check_datastore, parse_route_list, prepare_environment, read_route_list, BatchError,
    BatchRunner, BatchSummary, RouteListEntry,
};
pub use client::{
    ApiError, ExportFile, HttpRouteApi, ProcessAck, RouteApi, RouteCounts, RoutePage, RouteQuery,
    RouteStatusReport, Statistics,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, BatchConfig,
    Config, ConfigError, ConsoleConfig, DatabaseConfig, ServerConfig,
};
pub use console::{
    create_console_channel, BulkError, BulkSummary, Console, ConsoleEvent, ConsoleEventEnvelope,
    ConsoleHandle, DashboardRefresher, NotificationLevel, PollOutcome, PollerError,
    ProgressState, StatusPoller, TriggerOutcome,
};
pub use processing::{
    process_route, GeometryProcessor, ProcessError, ProcessOutcome, RouteAssessment,
    RouteProcessor,
};
pub use route::{
    NewRoute, RiskBucket, RiskLevel, RiskSummary, Route, RouteError, RouteFilter, RoutePoint,
    RouteStatus, RouteStore, SqliteRouteStore,
};
