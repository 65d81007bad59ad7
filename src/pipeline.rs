//! Ingestion pipeline orchestration.
//!
//! Wires the decoder, validator, upsert engine and notification dispatcher
//! together for one invocation: fetch bytes, decode, validate every row
//! before any write, commit the batch atomically, then fire a best-effort
//! notification. `run` is the crate's entry point and converts every
//! internal failure into a structured report; it never panics or propagates
//! across the boundary.

use crate::blob::{BlobFetch, DirBlobStore};
use crate::config::IngestConfig;
use crate::decoder::RecordDecoder;
use crate::error::{IngestError, Result};
use crate::notify::{BatchOutcome, NotificationDispatcher};
use crate::store::UserStore;
use crate::upsert::{ConflictPolicy, IngestionBatch};
use crate::validator::{validate_row, Strictness};
use log::{info, warn};
use serde::Serialize;

/// The structured result handed back to the caller.
///
/// Always produced, never an `Err`: failures are folded into
/// `status: "failure"` with a human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    /// `"success"` or `"failure"`
    pub status: &'static str,

    /// Rows processed (attempted); 0 on failure
    pub processed_count: usize,

    /// Human-readable failure message, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestionReport {
    fn success(processed_count: usize) -> Self {
        IngestionReport {
            status: "success",
            processed_count,
            error: None,
        }
    }

    fn failure(error: &IngestError) -> Self {
        IngestionReport {
            status: "failure",
            processed_count: 0,
            error: Some(error.to_string()),
        }
    }

    /// Whether the batch committed.
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

/// One-invocation ingestion pipeline over injected collaborators.
pub struct IngestionPipeline<B: BlobFetch> {
    store: UserStore,
    blobs: B,
    dispatcher: NotificationDispatcher,
}

impl IngestionPipeline<DirBlobStore> {
    /// Builds a pipeline from an explicit configuration record.
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let store = UserStore::open(&config.db_path)?;
        let blobs = DirBlobStore::new(&config.blob_root);
        let dispatcher =
            NotificationDispatcher::new(config.webhook_url.clone(), config.notify_timeout);

        Ok(IngestionPipeline::new(store, blobs, dispatcher))
    }
}

impl<B: BlobFetch> IngestionPipeline<B> {
    /// Builds a pipeline from already-constructed collaborators.
    pub fn new(store: UserStore, blobs: B, dispatcher: NotificationDispatcher) -> Self {
        IngestionPipeline {
            store,
            blobs,
            dispatcher,
        }
    }

    /// Runs one ingestion: fetch, decode, validate, commit, notify.
    ///
    /// Every internal failure is converted into a failure report; the
    /// notification fires only after a successful commit, and its own
    /// failure is logged and swallowed.
    pub fn run(&mut self, key: &str, policy: ConflictPolicy, strictness: Strictness) -> IngestionReport {
        match self.ingest(key, policy, strictness) {
            Ok(processed_count) => {
                info!(
                    "Ingested '{}': {} row(s) processed under {:?}/{:?}",
                    key, processed_count, policy, strictness
                );

                let outcome = BatchOutcome {
                    processed_count,
                    source: key.to_string(),
                    succeeded: true,
                };
                if let Err(e) = self.dispatcher.dispatch(&outcome) {
                    warn!("Notification for '{}' not delivered: {}", key, e);
                }

                IngestionReport::success(processed_count)
            }
            Err(e) => {
                warn!("Ingestion of '{}' failed: {}", key, e);
                IngestionReport::failure(&e)
            }
        }
    }

    /// The fallible path: everything up to and including the commit.
    ///
    /// Validation runs to completion over the whole file before the store is
    /// touched, so a batch containing an invalid row never reaches it.
    fn ingest(
        &mut self,
        key: &str,
        policy: ConflictPolicy,
        strictness: Strictness,
    ) -> Result<usize> {
        let bytes = self.blobs.fetch(key).map_err(|e| IngestError::Source {
            key: key.to_string(),
            source: e,
        })?;

        let decoder = RecordDecoder::new(&bytes)?;

        let mut records = Vec::new();
        for (row_idx, row) in decoder.enumerate() {
            let row = row?;
            let record = validate_row(&row, row_idx + 1, strictness)?;
            records.push(record);
        }

        let batch = IngestionBatch {
            records,
            policy,
            source: key.to_string(),
        };
        let processed = self.store.apply_batch(&batch)?;
        Ok(processed)
    }

    /// Read access to the store, for reporting call sites and tests.
    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Tears the pipeline down, closing the store connection.
    pub fn close(self) -> Result<()> {
        self.store.close()?;
        Ok(())
    }
}
