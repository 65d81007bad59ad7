//! Record validator and coercer: raw rows to typed `UserRecord`s.
//!
//! Two coercion modes exist and are deliberately kept as a single code path
//! parameterized by `Strictness`, so the modes cannot drift apart. A field
//! counts as present when its key exists in the decoded row, even with an
//! empty value; defaulting under the lenient mode applies only to absent
//! keys, and a present-but-unparsable numeric fails the row in both modes.

use crate::decimal::Decimal2;
use crate::error::{ValidationError, ValidationReason};
use crate::record::{columns, RawRow, UserRecord};
use std::str::FromStr;

/// Whether missing optional fields are rejected or defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Every column must be present and parse.
    Strict,

    /// `user_id`, `name`, `email` must be present; the numeric columns and
    /// `employment_status` are defaulted when absent.
    Lenient,
}

/// Validates one raw row into a `UserRecord`.
///
/// `row_num` is the 1-based position of the row among the file's data rows
/// (the first row after the header is row 1) and is carried into any
/// `ValidationError` together with the offending field name.
pub fn validate_row(
    row: &RawRow,
    row_num: usize,
    strictness: Strictness,
) -> Result<UserRecord, ValidationError> {
    let user_id = require(row, row_num, columns::USER_ID)?;
    if user_id.trim().is_empty() {
        return Err(ValidationError::new(
            row_num,
            columns::USER_ID,
            ValidationReason::Empty,
        ));
    }

    let name = require(row, row_num, columns::NAME)?;
    let email = require(row, row_num, columns::EMAIL)?;

    let monthly_income = match field(row, row_num, columns::MONTHLY_INCOME, strictness)? {
        Some(raw) => parse_income(raw, row_num)?,
        None => Decimal2::ZERO,
    };

    let credit_score = match field(row, row_num, columns::CREDIT_SCORE, strictness)? {
        Some(raw) => parse_integer(raw, row_num, columns::CREDIT_SCORE)?,
        None => 0,
    };

    let employment_status = match field(row, row_num, columns::EMPLOYMENT_STATUS, strictness)? {
        Some(raw) => raw.to_string(),
        None => "unknown".to_string(),
    };

    let age = match field(row, row_num, columns::AGE, strictness)? {
        Some(raw) => parse_integer(raw, row_num, columns::AGE)?,
        None => 0,
    };

    Ok(UserRecord {
        user_id: user_id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        monthly_income,
        credit_score,
        employment_status,
        age,
    })
}

/// Looks up a column that must be present in both modes.
fn require<'a>(
    row: &'a RawRow,
    row_num: usize,
    column: &'static str,
) -> Result<&'a str, ValidationError> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| ValidationError::new(row_num, column, ValidationReason::Missing))
}

/// Looks up a defaultable column: `Ok(None)` means "absent, use the default".
///
/// Absence is only tolerated under `Lenient`; under `Strict` it fails the row.
fn field<'a>(
    row: &'a RawRow,
    row_num: usize,
    column: &'static str,
    strictness: Strictness,
) -> Result<Option<&'a str>, ValidationError> {
    match row.get(column) {
        Some(value) => Ok(Some(value.as_str())),
        None => match strictness {
            Strictness::Strict => Err(ValidationError::new(
                row_num,
                column,
                ValidationReason::Missing,
            )),
            Strictness::Lenient => Ok(None),
        },
    }
}

/// Parses a base-10 decimal income and enforces non-negativity.
fn parse_income(raw: &str, row_num: usize) -> Result<Decimal2, ValidationError> {
    let income = Decimal2::from_str(raw).map_err(|_| {
        ValidationError::new(
            row_num,
            columns::MONTHLY_INCOME,
            ValidationReason::InvalidDecimal(raw.trim().to_string()),
        )
    })?;

    if income.is_negative() {
        return Err(ValidationError::new(
            row_num,
            columns::MONTHLY_INCOME,
            ValidationReason::Negative,
        ));
    }

    Ok(income)
}

/// Parses a base-10 integer; thousands separators and overflow fail the row.
fn parse_integer(raw: &str, row_num: usize, column: &'static str) -> Result<i32, ValidationError> {
    raw.trim().parse::<i32>().map_err(|_| {
        ValidationError::new(
            row_num,
            column,
            ValidationReason::InvalidInteger(raw.trim().to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_row() -> RawRow {
        row(&[
            ("user_id", "u1"),
            ("name", "Alice"),
            ("email", "a@x.com"),
            ("monthly_income", "2500.50"),
            ("credit_score", "710"),
            ("employment_status", "employed"),
            ("age", "34"),
        ])
    }

    #[test]
    fn test_complete_row_validates_in_both_modes() {
        for strictness in [Strictness::Strict, Strictness::Lenient] {
            let record = validate_row(&complete_row(), 1, strictness).unwrap();
            assert_eq!(record.user_id, "u1");
            assert_eq!(record.email, "a@x.com");
            assert_eq!(record.monthly_income.to_string(), "2500.50");
            assert_eq!(record.credit_score, 710);
            assert_eq!(record.employment_status, "employed");
            assert_eq!(record.age, 34);
        }
    }

    #[test]
    fn test_missing_email_fails_in_both_modes() {
        let mut r = complete_row();
        r.remove("email");

        for strictness in [Strictness::Strict, Strictness::Lenient] {
            let err = validate_row(&r, 3, strictness).unwrap_err();
            assert_eq!(err.row, 3);
            assert_eq!(err.field, "email");
            assert_eq!(err.reason, ValidationReason::Missing);
        }
    }

    #[test]
    fn test_missing_credit_score_fails_strict_defaults_lenient() {
        let mut r = complete_row();
        r.remove("credit_score");

        let err = validate_row(&r, 1, Strictness::Strict).unwrap_err();
        assert_eq!(err.field, "credit_score");

        let record = validate_row(&r, 1, Strictness::Lenient).unwrap();
        assert_eq!(record.credit_score, 0);
    }

    #[test]
    fn test_lenient_defaults_for_all_optional_fields() {
        let r = row(&[("user_id", "u1"), ("name", ""), ("email", "a@x.com")]);

        let record = validate_row(&r, 1, Strictness::Lenient).unwrap();
        assert!(record.monthly_income.is_zero());
        assert_eq!(record.credit_score, 0);
        assert_eq!(record.employment_status, "unknown");
        assert_eq!(record.age, 0);
    }

    #[test]
    fn test_unparsable_income_fails_in_both_modes() {
        let mut r = complete_row();
        r.insert("monthly_income".to_string(), "abc".to_string());

        for strictness in [Strictness::Strict, Strictness::Lenient] {
            let err = validate_row(&r, 2, strictness).unwrap_err();
            assert_eq!(err.field, "monthly_income");
            assert_eq!(
                err.reason,
                ValidationReason::InvalidDecimal("abc".to_string())
            );
        }
    }

    #[test]
    fn test_thousands_separators_are_rejected() {
        let mut r = complete_row();
        r.insert("monthly_income".to_string(), "1,000".to_string());
        assert!(validate_row(&r, 1, Strictness::Lenient).is_err());

        let mut r = complete_row();
        r.insert("age".to_string(), "1,000".to_string());
        assert!(validate_row(&r, 1, Strictness::Lenient).is_err());
    }

    #[test]
    fn test_negative_income_is_rejected() {
        let mut r = complete_row();
        r.insert("monthly_income".to_string(), "-10.00".to_string());

        let err = validate_row(&r, 1, Strictness::Strict).unwrap_err();
        assert_eq!(err.reason, ValidationReason::Negative);
    }

    #[test]
    fn test_present_but_empty_numeric_fails_lenient_too() {
        let mut r = complete_row();
        r.insert("age".to_string(), String::new());

        let err = validate_row(&r, 1, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "age");
        assert!(matches!(err.reason, ValidationReason::InvalidInteger(_)));
    }

    #[test]
    fn test_empty_user_id_is_rejected() {
        let mut r = complete_row();
        r.insert("user_id".to_string(), "   ".to_string());

        let err = validate_row(&r, 1, Strictness::Lenient).unwrap_err();
        assert_eq!(err.field, "user_id");
        assert_eq!(err.reason, ValidationReason::Empty);
    }

    #[test]
    fn test_empty_name_and_email_are_accepted() {
        let mut r = complete_row();
        r.insert("name".to_string(), String::new());
        r.insert("email".to_string(), String::new());

        let record = validate_row(&r, 1, Strictness::Strict).unwrap();
        assert!(record.name.is_empty());
        assert!(record.email.is_empty());
    }

    #[test]
    fn test_numeric_values_are_trimmed() {
        let mut r = complete_row();
        r.insert("age".to_string(), " 40 ".to_string());
        r.insert("monthly_income".to_string(), " 12.5 ".to_string());

        let record = validate_row(&r, 1, Strictness::Strict).unwrap();
        assert_eq!(record.age, 40);
        assert_eq!(record.monthly_income.to_string(), "12.50");
    }

    #[test]
    fn test_integer_overflow_fails_the_row() {
        let mut r = complete_row();
        r.insert("credit_score".to_string(), "99999999999999".to_string());

        let err = validate_row(&r, 1, Strictness::Strict).unwrap_err();
        assert!(matches!(err.reason, ValidationReason::InvalidInteger(_)));
    }
}
