//! # User Ingest
//!
//! A batch CSV user-record ingestion engine: decode an uploaded CSV into
//! raw rows, validate and coerce each row into a typed record, apply the
//! batch to a SQLite user store as one atomic transaction under a named
//! conflict policy, then notify a configured webhook of the outcome.
//!
//! ## Design Principles
//!
//! - **All-or-nothing batches**: every row is validated before any write,
//!   and the write is a single transaction
//! - **One code path per concern**: conflict handling is parameterized by
//!   [`ConflictPolicy`], field coercion by [`Strictness`], so the paired
//!   behaviors cannot drift apart
//! - **Fixed-point money**: incomes use 2 decimal places via `rust_decimal`
//! - **Best-effort notification**: at most one webhook attempt per batch,
//!   time-bounded, never able to fail the pipeline
//!
//! ## Example
//!
//! ```no_run
//! use user_ingest::{ConflictPolicy, IngestConfig, IngestionPipeline, Strictness};
//!
//! let config = IngestConfig::default();
//! let mut pipeline = IngestionPipeline::from_config(&config).unwrap();
//! let report = pipeline.run("uploads/users.csv", ConflictPolicy::Merge, Strictness::Lenient);
//! println!("{}", serde_json::to_string(&report).unwrap());
//! ```

pub mod blob;
pub mod config;
pub mod decimal;
pub mod decoder;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod upsert;
pub mod validator;

pub use blob::{BlobFetch, DirBlobStore};
pub use config::IngestConfig;
pub use decimal::Decimal2;
pub use decoder::RecordDecoder;
pub use error::{
    DecodeError, IngestError, NotificationError, Result, UpsertError, ValidationError,
    ValidationReason,
};
pub use notify::{BatchOutcome, NotificationDispatcher};
pub use pipeline::{IngestionPipeline, IngestionReport};
pub use record::{RawRow, UserRecord};
pub use store::{StoreStats, StoredUser, UserStore};
pub use upsert::{ConflictPolicy, IngestionBatch};
pub use validator::{validate_row, Strictness};
