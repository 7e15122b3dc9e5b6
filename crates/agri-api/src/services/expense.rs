//! Expenses booked against a season.
//!
//! An expense can only be added to or changed on a season that is still
//! editable, and is never dated before the season started.

use agri_core::{ExpenseId, FieldErrors, MessageCode, SeasonId, User};
use agri_state::{Expense, ExpenseRequest, Season};

use super::{persist_error, row_written, season};
use crate::error::AppError;
use crate::response::{Page, PageRequest};
use crate::state::AppState;

fn check_against_season(request: &ExpenseRequest, season: &Season) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(start) = season.start_date {
        if request.expense_date < start {
            errors.invalid("expense_date", "must not be before the season start date");
        }
    }
    errors.into_result()
}

pub async fn create(
    state: &AppState,
    actor: &User,
    season_id: SeasonId,
    request: ExpenseRequest,
) -> Result<Expense, AppError> {
    request.check()?;
    let season = season::get_editable(state, actor, season_id)?;
    check_against_season(&request, &season)?;

    let expense = Expense::new(&request, season.id, actor.id);
    state.expenses.insert(expense.id.0, expense.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::expenses::insert(pool, &expense).await {
            state.expenses.remove(&expense.id.0);
            return Err(persist_error("expense", expense.id, e));
        }
    }

    tracing::info!(
        expense_id = %expense.id,
        season_id = %season.id,
        total_cost = %expense.total_cost,
        "expense recorded"
    );
    Ok(expense)
}

pub fn get(state: &AppState, actor: &User, id: ExpenseId) -> Result<Expense, AppError> {
    state
        .expenses
        .get(id.as_uuid())
        .filter(|e| actor.is_admin() || e.owner_id == actor.id)
        .ok_or(AppError::NotFound(MessageCode::ExpenseNotFound))
}

/// Expenses visible to the actor, most recent first. Filtering by a season
/// the actor cannot see yields [`MessageCode::SeasonNotFound`].
pub fn list(
    state: &AppState,
    actor: &User,
    season_id: Option<SeasonId>,
    page: PageRequest,
) -> Result<Page<Expense>, AppError> {
    if let Some(id) = season_id {
        season::get(state, actor, id)?;
    }
    let mut expenses = state.expenses.filter(|e| {
        (actor.is_admin() || e.owner_id == actor.id) && season_id.map_or(true, |s| e.season_id == s)
    });
    expenses.sort_by(|a, b| {
        b.expense_date
            .cmp(&a.expense_date)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    Ok(Page::slice(expenses, page))
}

/// Replace an expense's line item. The total is recomputed.
pub async fn update(
    state: &AppState,
    actor: &User,
    id: ExpenseId,
    request: ExpenseRequest,
) -> Result<Expense, AppError> {
    request.check()?;
    let current = get(state, actor, id)?;
    let season = season::get_editable(state, actor, current.season_id)?;
    check_against_season(&request, &season)?;

    let (previous, expense) = state
        .expenses
        .update_returning(id.as_uuid(), |e| e.apply(&request))
        .ok_or(AppError::NotFound(MessageCode::ExpenseNotFound))?;
    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::expenses::save(pool, &expense).await) {
            state.expenses.restore_if_unchanged(&previous.id.0.clone(), &expense, previous);
            return Err(persist_error("expense", id, e));
        }
    }

    tracing::info!(expense_id = %id, total_cost = %expense.total_cost, "expense updated");
    Ok(expense)
}

pub async fn delete(state: &AppState, actor: &User, id: ExpenseId) -> Result<(), AppError> {
    let expense = get(state, actor, id)?;
    season::get_editable(state, actor, expense.season_id)?;

    let removed = state
        .expenses
        .remove(id.as_uuid())
        .ok_or(AppError::NotFound(MessageCode::ExpenseNotFound))?;
    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::expenses::delete(pool, id).await) {
            state.expenses.restore_if_absent(removed.id.0, removed);
            return Err(persist_error("expense", id, e));
        }
    }

    tracing::info!(expense_id = %id, "expense deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::{create_crop, create_plot, create_user, NewPlot, NewUser};
    use crate::services::season::NewSeason;
    use agri_core::UserRole;
    use agri_state::{SeasonRequest, SeasonStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn setup() -> (AppState, User, SeasonId) {
        let state = AppState::new();
        let owner = create_user(
            &state,
            NewUser {
                username: "khoa".into(),
                full_name: "Pham Khoa".into(),
                email: None,
                role: UserRole::Farmer,
            },
        )
        .await
        .unwrap();
        let plot = create_plot(
            &state,
            &owner,
            NewPlot {
                plot_name: "Terrace".into(),
                area_m2: None,
                soil_type: None,
            },
        )
        .await
        .unwrap();
        let crop = create_crop(&state, "Tea", None).await.unwrap();
        let season = season::create(
            &state,
            &owner,
            NewSeason {
                plot_id: plot.id,
                crop_id: crop.id,
                variety_id: None,
                request: SeasonRequest {
                    start_date: Some(d(2025, 3, 1)),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
        (state, owner, season.id)
    }

    fn request(item: &str, price: i64, quantity: i32, date: NaiveDate) -> ExpenseRequest {
        ExpenseRequest {
            item_name: item.into(),
            unit_price: Decimal::from(price),
            quantity,
            expense_date: date,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_computes_total_and_summary() {
        let (state, owner, season_id) = setup().await;
        let e = create(&state, &owner, season_id, request("Seedlings", 3, 200, d(2025, 3, 2)))
            .await
            .unwrap();
        assert_eq!(e.total_cost, Decimal::from(600));
        create(&state, &owner, season_id, request("Labour", 150, 2, d(2025, 3, 9)))
            .await
            .unwrap();

        let summary = season::expense_summary(&state, &owner, season_id).unwrap();
        assert_eq!(summary.expense_count, 2);
        assert_eq!(summary.total_cost, Decimal::from(900));

        let page = list(&state, &owner, Some(season_id), PageRequest::default()).unwrap();
        assert_eq!(page.content[0].item_name, "Labour");
    }

    #[tokio::test]
    async fn date_before_season_start_is_invalid() {
        let (state, owner, season_id) = setup().await;
        let err = create(&state, &owner, season_id, request("Tools", 10, 1, d(2025, 2, 1)))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.get("expense_date").is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_season_refuses_changes() {
        let (state, owner, season_id) = setup().await;
        let e = create(&state, &owner, season_id, request("Tools", 10, 1, d(2025, 3, 5)))
            .await
            .unwrap();
        season::change_status(&state, &owner, season_id, SeasonStatus::Cancelled, None)
            .await
            .unwrap();

        let err = update(&state, &owner, e.id, request("Tools", 12, 1, d(2025, 3, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(MessageCode::SeasonNotEditable)));
        assert!(delete(&state, &owner, e.id).await.is_err());
        assert_eq!(get(&state, &owner, e.id).unwrap().total_cost, Decimal::from(10));
    }

    #[tokio::test]
    async fn update_recomputes_and_delete_removes() {
        let (state, owner, season_id) = setup().await;
        let e = create(&state, &owner, season_id, request("Water", 2, 10, d(2025, 3, 5)))
            .await
            .unwrap();
        let updated = update(&state, &owner, e.id, request("Water", 2, 25, d(2025, 3, 5)))
            .await
            .unwrap();
        assert_eq!(updated.total_cost, Decimal::from(50));

        let stranger = User::new("z", "Z", UserRole::Farmer);
        assert!(matches!(
            get(&state, &stranger, e.id),
            Err(AppError::NotFound(MessageCode::ExpenseNotFound))
        ));
        assert!(list(&state, &stranger, Some(season_id), PageRequest::default()).is_err());

        delete(&state, &owner, e.id).await.unwrap();
        assert!(state.expenses.is_empty());
    }

    #[tokio::test]
    async fn bad_amounts_are_rejected_before_lookup() {
        let (state, owner, _) = setup().await;
        let err = create(&state, &owner, SeasonId::new(), request("Seeds", -1, 0, d(2025, 3, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
