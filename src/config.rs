//! Explicit pipeline configuration.
//!
//! The library reads no environment variables; callers assemble a config
//! record and hand it to `IngestionPipeline::from_config`.

use crate::notify;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a pipeline invocation needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Path of the SQLite user store
    pub db_path: PathBuf,

    /// Root directory of the blob store holding uploaded CSVs
    pub blob_root: PathBuf,

    /// Notification sink URL; `None` disables notifications
    pub webhook_url: Option<String>,

    /// Bound on the whole notification call
    pub notify_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            db_path: PathBuf::from("users.db"),
            blob_root: PathBuf::from("blobs"),
            webhook_url: None,
            notify_timeout: notify::DEFAULT_TIMEOUT,
        }
    }
}
