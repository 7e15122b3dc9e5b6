//! # Custom Extractors & Validation
//!
//! Request DTOs implement [`Validate`], which reports every failing field at
//! once. Handlers take axum extractors as `Result<_, Rejection>` and pass them
//! through the helpers here so malformed input becomes an `MSG4` envelope
//! instead of axum's plain-text rejection.

use agri_core::{DecimalBound, FieldErrors};
use rust_decimal::Decimal;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::AppError;

/// Field-level validation of a request body.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Flag `field` as missing when `value` is absent or blank.
pub fn require_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.missing(field);
    }
}

/// Flag `field` when `value` is longer than `max` characters.
pub fn limit_length(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.invalid(field, format!("must not exceed {max} characters"));
    }
}

/// Flag `field` when `value` does not fit a `NUMERIC(14, 2)` column.
pub fn limit_amount(errors: &mut FieldErrors, field: &str, value: Option<Decimal>) {
    if let Some(value) = value {
        DecimalBound::QUANTITY.check(errors, field, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), FieldErrors> {
            let mut errors = FieldErrors::new();
            require_text(&mut errors, "name", Some(&self.name));
            limit_length(&mut errors, "name", Some(&self.name), 5);
            errors.into_result()
        }
    }

    #[test]
    fn extract_json_ok() {
        let value = extract_json(Ok(Json(Named { name: "a".into() }))).unwrap();
        assert_eq!(value.name, "a");
    }

    #[test]
    fn validated_json_reports_fields() {
        let err = extract_validated_json(Ok(Json(Named { name: " ".into() }))).unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.has_missing()),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = extract_validated_json(Ok(Json(Named {
            name: "much too long".into(),
        })))
        .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert!(!fields.has_missing());
                assert!(fields.get("name").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn require_text_flags_none() {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "title", None);
        require_text(&mut errors, "other", Some("x"));
        assert_eq!(errors.len(), 1);
    }
}
