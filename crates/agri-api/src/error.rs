//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from agri-core and agri-state to HTTP status codes and
//! [`ErrorResponse`] bodies carrying a catalog code. Internal error details
//! are logged, never returned.

use std::collections::BTreeMap;
use std::fmt;

use agri_core::{AgriError, FieldErrors, MessageCode};
use agri_state::{RuleViolation, TransitionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::ErrorResponse;

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found or not visible to the caller (404).
    #[error("not found: {}", .0.text())]
    NotFound(MessageCode),

    /// Per-field validation failures (422).
    #[error("validation error: {0}")]
    Validation(FieldErrors),

    /// Body could not be parsed (422, `MSG4`).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The acting account is deactivated (403).
    #[error("account inactive")]
    AccountInactive,

    /// Uniqueness or other constraint violation (409, `MSG9`).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A business rule rejected the change (409).
    #[error("business rule violated: {}", .0.code())]
    BusinessRule(MessageCode),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and the catalog code sent to the client.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, MessageCode::NotFound.code()),
            Self::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors.code().code()),
            Self::BadRequest(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                MessageCode::InvalidFormat.code(),
            ),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::AccountInactive => (StatusCode::FORBIDDEN, MessageCode::AccountInactive.code()),
            Self::Conflict(_) => (
                StatusCode::CONFLICT,
                MessageCode::ConstraintViolation.code(),
            ),
            Self::BusinessRule(code) => (StatusCode::CONFLICT, code.code()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn into_error_response(self) -> ErrorResponse {
        let (status, code) = self.status_and_code();
        match self {
            Self::NotFound(what) => ErrorResponse::new(status, code, what.text()),
            Self::Validation(errors) => {
                ErrorResponse::new(status, code, errors.code().text()).with_field_errors(errors.into_map())
            }
            Self::BadRequest(detail) => {
                let mut fields = BTreeMap::new();
                fields.insert("body".to_string(), detail);
                ErrorResponse::new(status, code, MessageCode::InvalidFormat.text()).with_field_errors(fields)
            }
            Self::Unauthorized(msg) | Self::Forbidden(msg) => ErrorResponse::new(status, code, msg),
            Self::AccountInactive => ErrorResponse::new(status, code, MessageCode::AccountInactive.text()),
            Self::Conflict(msg) => ErrorResponse::new(status, code, msg),
            Self::BusinessRule(rule) => ErrorResponse::new(status, code, rule.text()),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                ErrorResponse::new(status, code, "An internal error occurred")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_error_response().into_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<RuleViolation> for AppError {
    fn from(violation: RuleViolation) -> Self {
        tracing::debug!(%violation, "season rule rejected change");
        Self::BusinessRule(violation.message_code())
    }
}

impl<S: fmt::Debug + fmt::Display> From<TransitionError<S>> for AppError {
    fn from(err: TransitionError<S>) -> Self {
        tracing::debug!(from = %err.from, to = %err.to, "status transition rejected");
        Self::BusinessRule(MessageCode::InvalidStatusTransition)
    }
}

impl From<AgriError> for AppError {
    fn from(err: AgriError) -> Self {
        match err {
            AgriError::Validation(errors) => Self::Validation(errors),
            other => Self::BadRequest(other.to_string()),
        }
    }
}
