//! # Message Catalog
//!
//! Fixed code → text pairs shown to end users. The numbered `MSG*` codes
//! are the generic screen messages; the named codes are domain-specific.
//! No logic attaches to these values.

use serde::{Deserialize, Serialize};

/// User-facing message codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCode {
    /// MSG1: a mandatory field is missing.
    #[serde(rename = "MSG1")]
    MandatoryField,
    /// MSG4: a field has an invalid format.
    #[serde(rename = "MSG4")]
    InvalidFormat,
    /// MSG7: the record was saved.
    #[serde(rename = "MSG7")]
    SaveSuccess,
    /// MSG9: the operation violates a data constraint.
    #[serde(rename = "MSG9")]
    ConstraintViolation,
    /// MSG10: no matching record.
    #[serde(rename = "MSG10")]
    NotFound,
    /// MSG11: confirmation prompt before a destructive action.
    #[serde(rename = "MSG11")]
    ConfirmPrompt,
    #[serde(rename = "SEASON_NOT_FOUND")]
    SeasonNotFound,
    #[serde(rename = "EXPENSE_NOT_FOUND")]
    ExpenseNotFound,
    #[serde(rename = "TASK_NOT_FOUND")]
    TaskNotFound,
    #[serde(rename = "PLOT_NOT_FOUND")]
    PlotNotFound,
    #[serde(rename = "CROP_NOT_FOUND")]
    CropNotFound,
    #[serde(rename = "VARIETY_NOT_FOUND")]
    VarietyNotFound,
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,
    /// Another season on the same plot already uses this name.
    #[serde(rename = "SEASON_NAME_DUPLICATE")]
    SeasonNameDuplicate,
    /// The season's dates overlap another season on the same plot.
    #[serde(rename = "SEASON_DATE_OVERLAP")]
    SeasonDateOverlap,
    /// The season is cancelled or archived and can no longer change.
    #[serde(rename = "SEASON_NOT_EDITABLE")]
    SeasonNotEditable,
    #[serde(rename = "INVALID_STATUS_TRANSITION")]
    InvalidStatusTransition,
    /// The acting account is deactivated.
    #[serde(rename = "ACCOUNT_INACTIVE")]
    AccountInactive,
}

impl MessageCode {
    /// Every code, in catalog order.
    pub const ALL: [MessageCode; 18] = [
        Self::MandatoryField,
        Self::InvalidFormat,
        Self::SaveSuccess,
        Self::ConstraintViolation,
        Self::NotFound,
        Self::ConfirmPrompt,
        Self::SeasonNotFound,
        Self::ExpenseNotFound,
        Self::TaskNotFound,
        Self::PlotNotFound,
        Self::CropNotFound,
        Self::VarietyNotFound,
        Self::UserNotFound,
        Self::SeasonNameDuplicate,
        Self::SeasonDateOverlap,
        Self::SeasonNotEditable,
        Self::InvalidStatusTransition,
        Self::AccountInactive,
    ];

    /// The short code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MandatoryField => "MSG1",
            Self::InvalidFormat => "MSG4",
            Self::SaveSuccess => "MSG7",
            Self::ConstraintViolation => "MSG9",
            Self::NotFound => "MSG10",
            Self::ConfirmPrompt => "MSG11",
            Self::SeasonNotFound => "SEASON_NOT_FOUND",
            Self::ExpenseNotFound => "EXPENSE_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::PlotNotFound => "PLOT_NOT_FOUND",
            Self::CropNotFound => "CROP_NOT_FOUND",
            Self::VarietyNotFound => "VARIETY_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::SeasonNameDuplicate => "SEASON_NAME_DUPLICATE",
            Self::SeasonDateOverlap => "SEASON_DATE_OVERLAP",
            Self::SeasonNotEditable => "SEASON_NOT_EDITABLE",
            Self::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
        }
    }

    /// The human-readable text for this code.
    pub fn text(&self) -> &'static str {
        match self {
            Self::MandatoryField => "Please fill in all mandatory fields.",
            Self::InvalidFormat => "One or more fields have an invalid format.",
            Self::SaveSuccess => "Saved successfully.",
            Self::ConstraintViolation => "The data violates a constraint and cannot be saved.",
            Self::NotFound => "No matching record was found.",
            Self::ConfirmPrompt => "Are you sure you want to continue?",
            Self::SeasonNotFound => "Season not found.",
            Self::ExpenseNotFound => "Expense not found.",
            Self::TaskNotFound => "Task not found.",
            Self::PlotNotFound => "Plot not found.",
            Self::CropNotFound => "Crop not found.",
            Self::VarietyNotFound => "Variety not found.",
            Self::UserNotFound => "User not found.",
            Self::SeasonNameDuplicate => "A season with this name already exists on the plot.",
            Self::SeasonDateOverlap => "The season dates overlap another season on the plot.",
            Self::SeasonNotEditable => "The season is closed and can no longer be changed.",
            Self::InvalidStatusTransition => "The requested status change is not allowed.",
            Self::AccountInactive => "Your account is inactive. Access denied.",
        }
    }

    /// Look up a code by its short string.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }
}

impl std::fmt::Display for MessageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn numbered_codes_match_catalog() {
        assert_eq!(MessageCode::MandatoryField.code(), "MSG1");
        assert_eq!(MessageCode::InvalidFormat.code(), "MSG4");
        assert_eq!(MessageCode::SaveSuccess.code(), "MSG7");
        assert_eq!(MessageCode::ConstraintViolation.code(), "MSG9");
        assert_eq!(MessageCode::NotFound.code(), "MSG10");
        assert_eq!(MessageCode::ConfirmPrompt.code(), "MSG11");
    }

    #[test]
    fn codes_are_unique_and_round_trip() {
        let codes: HashSet<&str> = MessageCode::ALL.iter().map(|m| m.code()).collect();
        assert_eq!(codes.len(), MessageCode::ALL.len());
        for m in MessageCode::ALL {
            assert_eq!(MessageCode::from_code(m.code()), Some(m));
            assert!(!m.text().is_empty());
        }
        assert_eq!(MessageCode::from_code("MSG99"), None);
    }

    #[test]
    fn serde_uses_short_code() {
        let json = serde_json::to_string(&MessageCode::SeasonDateOverlap).unwrap();
        assert_eq!(json, "\"SEASON_DATE_OVERLAP\"");
        let m: MessageCode = serde_json::from_str("\"MSG10\"").unwrap();
        assert_eq!(m, MessageCode::NotFound);
    }
}
