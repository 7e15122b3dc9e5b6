//! Season lifecycle: creation through [`SeasonFactory`], field edits,
//! status transitions through [`SeasonStatusPolicy`] and expense totals.
//!
//! Every change that can affect a plot's other seasons (name, dates,
//! completion) is validated against them and stored under one write lock on
//! the season store, so two concurrent requests cannot both pass the
//! duplicate-name or overlap check.

use std::cmp::Ordering;

use agri_core::{CropId, FieldErrors, MessageCode, PlotId, SeasonId, User, UserId, VarietyId};
use agri_state::{
    check_season_dates, check_season_rules, ExpenseSummary, Season, SeasonFactory, SeasonRequest,
    SeasonStatus, SeasonStatusPolicy, SeasonUpdate, StatusTransitionStrategy,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{catalog, persist_error, row_written};
use crate::error::AppError;
use crate::response::{Page, PageRequest};
use crate::state::AppState;

/// Input for [`create`]: where and what to plant, plus the season fields.
#[derive(Debug, Clone)]
pub struct NewSeason {
    pub plot_id: PlotId,
    pub crop_id: CropId,
    pub variety_id: Option<VarietyId>,
    pub request: SeasonRequest,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonFilter {
    pub plot_id: Option<PlotId>,
    pub status: Option<SeasonStatus>,
}

/// Owner of the plot a season is planted on.
fn season_owner(state: &AppState, season: &Season) -> Option<UserId> {
    season
        .plot_id
        .and_then(|plot| state.plots.get(plot.as_uuid()))
        .map(|plot| plot.owner_id)
}

pub(crate) fn visible(state: &AppState, actor: &User, season: &Season) -> bool {
    actor.is_admin() || season_owner(state, season) == Some(actor.id)
}

/// Look up a season the actor may see.
pub fn get(state: &AppState, actor: &User, id: SeasonId) -> Result<Season, AppError> {
    state
        .seasons
        .get(id.as_uuid())
        .filter(|s| visible(state, actor, s))
        .ok_or(AppError::NotFound(MessageCode::SeasonNotFound))
}

/// Like [`get`], but also rejects seasons that are closed for changes.
pub fn get_editable(state: &AppState, actor: &User, id: SeasonId) -> Result<Season, AppError> {
    let season = get(state, actor, id)?;
    if !season.status.is_editable() {
        return Err(AppError::BusinessRule(MessageCode::SeasonNotEditable));
    }
    Ok(season)
}

/// Create a season on one of the actor's plots.
pub async fn create(state: &AppState, actor: &User, new: NewSeason) -> Result<Season, AppError> {
    let plot = catalog::get_plot(state, actor, new.plot_id)?;
    let crop = catalog::get_crop(state, new.crop_id)?;
    let variety = match new.variety_id {
        Some(id) => Some(
            state
                .varieties
                .get(id.as_uuid())
                .filter(|v| v.crop_id == crop.id)
                .ok_or(AppError::NotFound(MessageCode::VarietyNotFound))?,
        ),
        None => None,
    };

    let req = &new.request;
    check_season_dates(req.start_date, req.planned_harvest_date, req.end_date)?;

    let season = SeasonFactory::new().create_with_entities(req, actor, &plot, &crop, variety.as_ref());

    state.seasons.with_write(|seasons| {
        check_season_rules(&season, seasons.values())?;
        seasons.insert(season.id.0, season.clone());
        Ok::<_, AppError>(())
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::seasons::insert(pool, &season).await {
            state.seasons.remove(&season.id.0);
            return Err(persist_error("season", season.id, e));
        }
    }

    tracing::info!(
        season_id = %season.id,
        plot_id = %plot.id,
        name = %season.season_name,
        "season created"
    );
    Ok(season)
}

/// Seasons visible to the actor, newest start first.
pub fn list(state: &AppState, actor: &User, filter: SeasonFilter, page: PageRequest) -> Page<Season> {
    let mut seasons = state.seasons.filter(|s| {
        filter.plot_id.map_or(true, |p| s.plot_id == Some(p))
            && filter.status.map_or(true, |st| s.status == st)
    });
    seasons.retain(|s| visible(state, actor, s));
    seasons.sort_by(newest_first);
    Page::slice(seasons, page)
}

fn newest_first(a: &Season, b: &Season) -> Ordering {
    match (a.start_date, b.start_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.season_name.cmp(&b.season_name))
}

async fn persist_or_restore(state: &AppState, season: &Season, previous: Season) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::seasons::save(pool, season).await) {
            state.seasons.restore_if_unchanged(&previous.id.0.clone(), season, previous);
            return Err(persist_error("season", season.id, e));
        }
    }
    Ok(())
}

/// Edit a season's fields. Closed seasons (cancelled or archived) are
/// read-only.
pub async fn update(
    state: &AppState,
    actor: &User,
    id: SeasonId,
    update: SeasonUpdate,
) -> Result<Season, AppError> {
    get_editable(state, actor, id)?;

    let (previous, season) = state.seasons.with_write(|seasons| {
        let previous = seasons
            .get(id.as_uuid())
            .cloned()
            .ok_or(AppError::NotFound(MessageCode::SeasonNotFound))?;
        if !previous.status.is_editable() {
            return Err(AppError::BusinessRule(MessageCode::SeasonNotEditable));
        }
        let mut season = previous.clone();
        update.apply_to(&mut season);
        check_season_dates(season.start_date, season.planned_harvest_date, season.end_date)?;
        check_season_rules(&season, seasons.values())?;
        seasons.insert(season.id.0, season.clone());
        Ok((previous, season))
    })?;
    persist_or_restore(state, &season, previous).await?;

    tracing::info!(season_id = %season.id, "season updated");
    Ok(season)
}

/// Move a season to `target`.
///
/// Completing a season records `actual_yield_kg` when given and closes the
/// season today unless an end date is already set.
pub async fn change_status(
    state: &AppState,
    actor: &User,
    id: SeasonId,
    target: SeasonStatus,
    actual_yield_kg: Option<Decimal>,
) -> Result<Season, AppError> {
    get(state, actor, id)?;
    if actual_yield_kg.is_some() && target != SeasonStatus::Completed {
        let mut errors = FieldErrors::new();
        errors.invalid("actual_yield_kg", "only accepted when completing a season");
        return Err(errors.into());
    }
    let today = Utc::now().date_naive();

    let (previous, season) = state.seasons.with_write(|seasons| {
        let previous = seasons
            .get(id.as_uuid())
            .cloned()
            .ok_or(AppError::NotFound(MessageCode::SeasonNotFound))?;
        SeasonStatusPolicy.check_transition(previous.status, target)?;

        let mut season = previous.clone();
        season.status = target;
        if target == SeasonStatus::Completed {
            if season.end_date.is_none() {
                season.end_date = Some(completion_date(season.start_date, today));
            }
            if actual_yield_kg.is_some() {
                season.actual_yield_kg = actual_yield_kg;
            }
            check_season_rules(&season, seasons.values())?;
        }
        seasons.insert(season.id.0, season.clone());
        Ok::<_, AppError>((previous, season))
    })?;
    persist_or_restore(state, &season, previous.clone()).await?;

    tracing::info!(
        season_id = %season.id,
        from = %previous.status,
        to = %target,
        "season status changed"
    );
    Ok(season)
}

/// The end date given to a season completed on `today`. Never before the
/// season's start.
fn completion_date(start: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    start.map_or(today, |s| s.max(today))
}

/// Count and total cost of the expenses booked on a season.
pub fn expense_summary(
    state: &AppState,
    actor: &User,
    id: SeasonId,
) -> Result<ExpenseSummary, AppError> {
    let season = get(state, actor, id)?;
    let expenses = state.expenses.filter(|e| e.season_id == season.id);
    ExpenseSummary::of(&expenses)
        .map_err(|e| AppError::Internal(format!("season {}: {e}", season.id)))
}
