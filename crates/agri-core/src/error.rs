//! # Error Types
//!
//! Structured errors for the core primitives, built with `thiserror`.
//!
//! [`FieldErrors`] is the accumulator used by request validation: each entry
//! names a field and the reason it was rejected. A missing mandatory field
//! outranks a format error, so the collection reports [`MessageCode::MandatoryField`]
//! whenever at least one field was missing and [`MessageCode::InvalidFormat`]
//! otherwise.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::message::MessageCode;

/// Top-level error type for core primitives.
#[derive(Error, Debug)]
pub enum AgriError {
    /// Request validation failed for one or more fields.
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// A status or role name did not match any known variant.
    #[error("unknown {kind} \"{value}\"")]
    UnknownVariant {
        /// The enum being parsed (e.g. "season status").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A monetary amount was negative or overflowed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
    missing: bool,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a mandatory field was absent or blank.
    pub fn missing(&mut self, field: &str) {
        self.missing = true;
        self.fields
            .insert(field.to_string(), MessageCode::MandatoryField.text().to_string());
    }

    /// Record that a field was present but malformed.
    ///
    /// An earlier "missing" entry for the same field is kept.
    pub fn invalid(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether any mandatory field was missing.
    pub fn has_missing(&self) -> bool {
        self.missing
    }

    /// The message code summarizing this collection.
    pub fn code(&self) -> MessageCode {
        if self.missing {
            MessageCode::MandatoryField
        } else {
            MessageCode::InvalidFormat
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.fields
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}
