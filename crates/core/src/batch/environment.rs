//! Batch environment setup and datastore check.

use std::path::Path;

use tracing::{error, info};

use super::BatchError;
use crate::config::BatchConfig;
use crate::route::{RouteError, SqliteRouteStore};

/// Prepare the working environment for a batch run.
///
/// There are no runtime dependencies to install, so that step is only
/// logged. The configured working directories are created if missing.
pub fn prepare_environment(config: &BatchConfig) -> Result<(), BatchError> {
    info!("Dependency installation skipped: the batch binary is self-contained");

    for dir in &config.directories {
        std::fs::create_dir_all(dir).map_err(|source| BatchError::Directory {
            path: dir.clone(),
            source,
        })?;
        info!(path = %dir.display(), "Working directory ready");
    }

    Ok(())
}

/// Open the existing datastore at `path` and check that it answers queries.
///
/// The database file is never created here.
pub fn check_datastore(path: &Path) -> Result<SqliteRouteStore, BatchError> {
    let store = SqliteRouteStore::open_existing(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Datastore check failed");
        match e {
            RouteError::Unreachable(msg) => BatchError::DatastoreUnreachable(msg),
            other => BatchError::DatastoreUnreachable(other.to_string()),
        }
    })?;

    info!(path = %path.display(), "Datastore reachable");
    Ok(store)
}
