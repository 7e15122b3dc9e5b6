//! # Expense
//!
//! A cost line recorded against a season. The total is always derived as
//! `unit_price × quantity` and is recomputed whenever either changes.

use agri_core::{AgriError, DecimalBound, ExpenseId, FieldErrors, SeasonId, UserId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload an expense is created or replaced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub expense_date: NaiveDate,
    pub notes: Option<String>,
}

impl ExpenseRequest {
    /// Format checks on the amounts and name.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.item_name.trim().is_empty() {
            errors.missing("item_name");
        }
        if self.unit_price.is_sign_negative() {
            errors.invalid("unit_price", "must not be negative");
        } else {
            DecimalBound::QUANTITY.check(&mut errors, "unit_price", self.unit_price);
        }
        if self.quantity <= 0 {
            errors.invalid("quantity", "must be greater than zero");
        }
        if !self.total().is_some_and(|t| DecimalBound::TOTAL.fits(t)) {
            errors.invalid("unit_price", "total amount is too large");
        }
        errors.into_result()
    }

    fn total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// An expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub season_id: SeasonId,
    pub owner_id: UserId,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_cost: Decimal,
    pub expense_date: NaiveDate,
    pub notes: Option<String>,
}

impl Expense {
    /// Build a new expense. The request must have passed [`ExpenseRequest::check`].
    pub fn new(request: &ExpenseRequest, season_id: SeasonId, owner_id: UserId) -> Self {
        Self {
            id: ExpenseId::new(),
            season_id,
            owner_id,
            item_name: request.item_name.clone(),
            unit_price: request.unit_price,
            quantity: request.quantity,
            total_cost: request.total().unwrap_or_default(),
            expense_date: request.expense_date,
            notes: request.notes.clone(),
        }
    }

    /// Replace the line item with `request`, recomputing the total.
    pub fn apply(&mut self, request: &ExpenseRequest) {
        self.item_name = request.item_name.clone();
        self.unit_price = request.unit_price;
        self.quantity = request.quantity;
        self.total_cost = request.total().unwrap_or_default();
        self.expense_date = request.expense_date;
        self.notes = request.notes.clone();
    }
}

/// Count and sum of a season's expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub expense_count: usize,
    pub total_cost: Decimal,
}

impl ExpenseSummary {
    /// Fails with [`AgriError::InvalidAmount`] if the sum overflows.
    pub fn of<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Result<Self, AgriError> {
        expenses.into_iter().try_fold(Self::default(), |acc, e| {
            let total_cost = acc
                .total_cost
                .checked_add(e.total_cost)
                .ok_or_else(|| AgriError::InvalidAmount("expense total overflowed".to_string()))?;
            Ok(Self {
                expense_count: acc.expense_count + 1,
                total_cost,
            })
        })
    }
}
