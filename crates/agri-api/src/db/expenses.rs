//! Expense persistence. `total_cost` is stored as computed by the
//! application so reports never re-derive it in SQL.

use agri_core::{ExpenseId, SeasonId, UserId};
use agri_state::Expense;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, expense: &Expense) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO expenses (id, season_id, owner_id, item_name, unit_price, quantity,
                               total_cost, expense_date, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(expense.id.0)
    .bind(expense.season_id.0)
    .bind(expense.owner_id.0)
    .bind(&expense.item_name)
    .bind(expense.unit_price)
    .bind(expense.quantity)
    .bind(expense.total_cost)
    .bind(expense.expense_date)
    .bind(&expense.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn save(pool: &PgPool, expense: &Expense) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE expenses SET item_name = $1, unit_price = $2, quantity = $3, total_cost = $4,
                expense_date = $5, notes = $6
         WHERE id = $7",
    )
    .bind(&expense.item_name)
    .bind(expense.unit_price)
    .bind(expense.quantity)
    .bind(expense.total_cost)
    .bind(expense.expense_date)
    .bind(&expense.notes)
    .bind(expense.id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: ExpenseId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Expense>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExpenseRow>(
        "SELECT id, season_id, owner_id, item_name, unit_price, quantity, total_cost,
                expense_date, notes
         FROM expenses ORDER BY expense_date",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ExpenseRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    season_id: Uuid,
    owner_id: Uuid,
    item_name: String,
    unit_price: Decimal,
    quantity: i32,
    total_cost: Decimal,
    expense_date: NaiveDate,
    notes: Option<String>,
}

impl ExpenseRow {
    fn into_record(self) -> Expense {
        Expense {
            id: ExpenseId::from_uuid(self.id),
            season_id: SeasonId::from_uuid(self.season_id),
            owner_id: UserId::from_uuid(self.owner_id),
            item_name: self.item_name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            total_cost: self.total_cost,
            expense_date: self.expense_date,
            notes: self.notes,
        }
    }
}
