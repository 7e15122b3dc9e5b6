//! # API Route Modules
//!
//! One module per resource. Each exposes `router() -> Router<AppState>`,
//! merged under `/v1` by [`crate::app`].
//!
//! - `users`: account management and `/v1/users/me`.
//! - `plots`: land parcels owned by the acting user.
//! - `crops`: the crop and variety catalog.
//! - `seasons`: season lifecycle, status changes and expense totals.
//! - `tasks`: task CRUD and status changes.
//! - `expenses`: expense CRUD.
//!
//! Handlers translate request DTOs into service calls and wrap the results
//! in [`ApiResponse`] envelopes; listings are paged with `page` / `size`
//! query parameters and answer with a [`crate::response::PageResponse`].
//! Request and response DTOs carry plain UUIDs and status strings so they
//! can be described in the OpenAPI document.

pub mod crops;
pub mod expenses;
pub mod plots;
pub mod seasons;
pub mod tasks;
pub mod users;

use agri_core::{AgriError, FieldErrors, MessageCode};

use crate::response::ApiResponse;

/// Envelope for a successful create or update.
pub(crate) fn saved<T>(result: T) -> ApiResponse<T> {
    ApiResponse::success_with_message(MessageCode::SaveSuccess.text(), result)
}

/// Parse an enum name from a request, recording a field error on failure.
pub(crate) fn parse_field<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Result<T, AgriError>,
) -> Option<T> {
    match value {
        None => {
            errors.missing(field);
            None
        }
        Some(v) => match parse(v) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.invalid(field, e.to_string());
                None
            }
        },
    }
}

/// Parse an optional enum name from a query string.
pub(crate) fn parse_filter<T>(
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Result<T, AgriError>,
) -> Result<Option<T>, FieldErrors> {
    let Some(v) = value else {
        return Ok(None);
    };
    let mut errors = FieldErrors::new();
    let parsed = parse_field(&mut errors, field, Some(v), parse);
    errors.into_result().map(|()| parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_state::SeasonStatus;

    #[test]
    fn saved_uses_catalog_text() {
        let r = saved(1);
        assert_eq!(r.status, 200);
        assert_eq!(r.message, MessageCode::SaveSuccess.text());
    }

    #[test]
    fn parse_field_reports_missing_and_invalid() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_field(&mut errors, "status", None, SeasonStatus::from_name), None);
        assert!(errors.has_missing());

        let mut errors = FieldErrors::new();
        assert_eq!(
            parse_field(&mut errors, "status", Some("GROWING"), SeasonStatus::from_name),
            None
        );
        assert!(errors.get("status").is_some());
        assert!(!errors.has_missing());

        let mut errors = FieldErrors::new();
        assert_eq!(
            parse_field(&mut errors, "status", Some("ACTIVE"), SeasonStatus::from_name),
            Some(SeasonStatus::Active)
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn parse_filter_absent_is_none() {
        assert_eq!(parse_filter("status", None, SeasonStatus::from_name).unwrap(), None);
        assert!(parse_filter("status", Some("x"), SeasonStatus::from_name).is_err());
    }
}
