//! # Response Envelopes
//!
//! Every `/v1/*` endpoint answers with one of three shapes:
//!
//! - [`ApiResponse`] wraps a single result with a status, code and message;
//! - [`PageResponse`] carries one page of a listing (inside an `ApiResponse`);
//! - [`ErrorResponse`] is the body of every failure, with per-field messages.
//!
//! Building an envelope cannot fail.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Code carried by every successful envelope.
pub const SUCCESS_CODE: &str = "SUCCESS";
/// Message carried by [`ApiResponse::success`].
pub const SUCCESS_MESSAGE: &str = "OK";

/// Uniform wrapper for a single result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 / `SUCCESS` / `OK` around `result`.
    pub fn success(result: T) -> Self {
        Self::success_with_message(SUCCESS_MESSAGE, result)
    }

    /// 200 / `SUCCESS` with a custom message.
    pub fn success_with_message(message: impl Into<String>, result: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            code: SUCCESS_CODE.to_string(),
            message: message.into(),
            result: Some(result),
        }
    }

    /// A failure envelope. `result` is always null.
    pub fn error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            result: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

// ── Pagination ───────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A zero-based page request. Sizes are clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize).saturating_mul(self.size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a query result, before mapping to response items.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Cut the requested page out of an already filtered and ordered list.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_elements = all.len() as u64;
        let content = all
            .into_iter()
            .skip(request.offset())
            .take(request.size as usize)
            .collect();
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        let pages = self.total_elements.div_ceil(u64::from(self.size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// A page of mapped items plus the paging metadata of the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Combine the metadata of `page` with `items`, which the caller has
    /// already mapped from `page.content`.
    pub fn from_page<S>(page: &Page<S>, items: Vec<T>) -> Self {
        Self {
            items,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages(),
        }
    }
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(mut page: Page<T>) -> Self {
        let items = std::mem::take(&mut page.content);
        Self::from_page(&page, items)
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Body of every error response.
///
/// `path` is filled in by the error-path middleware after the handler ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub field_errors: BTreeMap<String, String>,
    pub path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            code: code.into(),
            message: message.into(),
            field_errors: BTreeMap::new(),
            path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_field_errors(mut self, field_errors: BTreeMap<String, String>) -> Self {
        self.field_errors = field_errors;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Serializes the body and keeps a copy in the response extensions so the
/// error-path middleware can re-render it with the request path.
impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}
