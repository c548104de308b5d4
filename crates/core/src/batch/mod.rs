//! One-shot batch processing of stored routes.
//!
//! The batch launcher prepares its working environment, verifies the
//! datastore, then sweeps either every pending route or the routes named in a
//! route-list file through a fixed-size worker pool.

mod environment;
mod route_list;
mod runner;

pub use environment::{check_datastore, prepare_environment};
pub use route_list::{parse_route_list, read_route_list, RouteListEntry};
pub use runner::{BatchRunner, BatchSummary, PoolStatus};

use std::path::PathBuf;

use thiserror::Error;

use crate::route::RouteError;

/// Error type for batch operations.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The datastore could not be opened or queried.
    #[error("Datastore unreachable: {0}")]
    DatastoreUnreachable(String),

    /// A working directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The route-list file could not be read.
    #[error("Failed to read route list {path}: {source}")]
    RouteList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Route store error.
    #[error(transparent)]
    Store(#[from] RouteError),
}
