//! User record models: the raw decoded row and the typed, validated record.

use crate::decimal::Decimal2;
use std::collections::HashMap;

/// A raw CSV row after decoding: header name to cell value.
///
/// A row shorter than the header simply lacks the trailing keys; semantic
/// checks happen later in the validator.
pub type RawRow = HashMap<String, String>;

/// Column names of the ingestion CSV format.
///
/// Additional columns in an uploaded file are ignored; these are the ones
/// the validator looks for.
pub mod columns {
    pub const USER_ID: &str = "user_id";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const MONTHLY_INCOME: &str = "monthly_income";
    pub const CREDIT_SCORE: &str = "credit_score";
    pub const EMPLOYMENT_STATUS: &str = "employment_status";
    pub const AGE: &str = "age";
}

/// One validated, fully typed ingested user.
///
/// Instances are transient: constructed by the validator, consumed by the
/// upsert engine, never retained afterward. The store-assigned `created_at`
/// timestamp lives on the read side (`StoredUser`), not here.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Unique identity key for upsert matching; never empty
    pub user_id: String,

    /// Display name; may be empty
    pub name: String,

    /// Contact email; presence required, format not validated
    pub email: String,

    /// Non-negative monthly income
    pub monthly_income: Decimal2,

    /// Credit score
    pub credit_score: i32,

    /// Employment status label
    pub employment_status: String,

    /// Age in years
    pub age: i32,
}
