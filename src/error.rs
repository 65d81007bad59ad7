//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while decoding CSV bytes into raw rows.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Input bytes are not valid UTF-8 text
    #[error("Input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The CSV structure itself is malformed (e.g. an unterminated quote)
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A row that failed required-field or numeric-coercion rules.
///
/// Carries the 1-based position of the row among the file's data rows
/// (the first row after the header is row 1) and the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid record at row {row}, field '{field}': {reason}")]
pub struct ValidationError {
    /// 1-based data-row position within the file
    pub row: usize,

    /// Name of the offending column
    pub field: &'static str,

    /// What was wrong with the value
    pub reason: ValidationReason,
}

impl ValidationError {
    pub(crate) fn new(row: usize, field: &'static str, reason: ValidationReason) -> Self {
        ValidationError { row, field, reason }
    }
}

/// The specific rule a field value violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// The column is required but the row has no value for it
    #[error("required field is missing")]
    Missing,

    /// The value must not be empty
    #[error("must not be empty")]
    Empty,

    /// The value did not parse as a base-10 decimal
    #[error("'{0}' is not a valid decimal")]
    InvalidDecimal(String),

    /// The value did not parse as a base-10 integer
    #[error("'{0}' is not a valid integer")]
    InvalidInteger(String),

    /// The value parsed but must not be negative
    #[error("must not be negative")]
    Negative,
}

/// A storage-layer fault: constraint violation not explained by the declared
/// conflict policy, connectivity loss, or a transaction failure.
#[derive(Error, Debug)]
#[error("Storage fault: {0}")]
pub struct UpsertError(#[from] pub rusqlite::Error);

/// A webhook delivery failure (connect error, timeout, or non-2xx response).
///
/// Never propagated out of the pipeline; the dispatcher's caller logs it and
/// carries on.
#[derive(Error, Debug)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(#[from] pub ureq::Error);

/// Umbrella error for a pipeline run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source object could not be fetched from the blob store
    #[error("Source object '{key}' unavailable: {source}")]
    Source {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or write a local file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV bytes could not be decoded into rows
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A row failed validation; the batch was abandoned before any write
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store rejected the batch; the transaction was rolled back
    #[error("Upsert failed: {0}")]
    Upsert(#[from] UpsertError),

    /// Failed to serialize a report or stats snapshot to JSON
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing object key argument
    #[error("Missing object key argument. Usage: user-ingest [options] <object-key>")]
    MissingArgument,

    /// A command-line option had an unusable value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
