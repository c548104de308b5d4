use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hpcl_routes.db")
}

/// Console (route processing front end) configuration.
///
/// All intervals are in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    /// Base URL of the route API server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Period between two status requests for one route.
    #[serde(default = "default_status_poll_interval")]
    pub status_poll_interval_ms: u64,

    /// Offset between consecutive start requests of a bulk run.
    #[serde(default = "default_bulk_stagger")]
    pub bulk_stagger_ms: u64,

    /// Period of the dashboard statistics refresh.
    #[serde(default = "default_dashboard_refresh_interval")]
    pub dashboard_refresh_interval_ms: u64,

    /// Delay before the progress indicator is removed after completion.
    #[serde(default = "default_progress_close_delay")]
    pub progress_close_delay_ms: u64,

    /// Whether a risk distribution chart is shown on the dashboard.
    #[serde(default = "default_true")]
    pub risk_chart: bool,

    /// Give up polling a route after this many status requests (None = never).
    #[serde(default)]
    pub max_status_polls: Option<u32>,

    /// Capacity of the console event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_status_poll_interval() -> u64 {
    2000 // 2 seconds
}

fn default_bulk_stagger() -> u64 {
    1000 // 1 second
}

fn default_dashboard_refresh_interval() -> u64 {
    30_000 // 30 seconds
}

fn default_progress_close_delay() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            status_poll_interval_ms: default_status_poll_interval(),
            bulk_stagger_ms: default_bulk_stagger(),
            dashboard_refresh_interval_ms: default_dashboard_refresh_interval(),
            progress_close_delay_ms: default_progress_close_delay(),
            risk_chart: true,
            max_status_polls: None,
            event_buffer: default_event_buffer(),
        }
    }
}

/// Shortest period used for a timer loop; a zero period would panic.
const MIN_LOOP_PERIOD: Duration = Duration::from_millis(1);

impl ConsoleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poll period, at least 1 ms.
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms).max(MIN_LOOP_PERIOD)
    }

    pub fn bulk_stagger(&self) -> Duration {
        Duration::from_millis(self.bulk_stagger_ms)
    }

    /// Refresh period, at least 1 ms.
    pub fn dashboard_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_refresh_interval_ms).max(MIN_LOOP_PERIOD)
    }

    pub fn progress_close_delay(&self) -> Duration {
        Duration::from_millis(self.progress_close_delay_ms)
    }
}

/// Batch launcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Worker pool size when `--workers` is not given.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Working directories created before a run.
    #[serde(default = "default_directories")]
    pub directories: Vec<PathBuf>,

    /// Also sweep routes whose previous processing failed.
    #[serde(default)]
    pub retry_failed: bool,

    /// Minimum heading change (degrees) counted as a sharp turn.
    #[serde(default = "default_sharp_turn_threshold")]
    pub sharp_turn_threshold_deg: f64,
}

fn default_workers() -> usize {
    5
}

fn default_directories() -> Vec<PathBuf> {
    vec![
        PathBuf::from("uploads"),
        PathBuf::from("reports"),
        PathBuf::from("route_data"),
    ]
}

fn default_sharp_turn_threshold() -> f64 {
    60.0
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            directories: default_directories(),
            retry_failed: false,
            sharp_turn_threshold_deg: default_sharp_turn_threshold(),
        }
    }
}
