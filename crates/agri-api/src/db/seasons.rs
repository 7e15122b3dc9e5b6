//! Season persistence operations.
//!
//! Status transitions are enforced by the season service through the
//! status strategy, not in SQL. `save` writes the full row, so one call
//! covers field edits and status changes alike.

use agri_core::{CropId, PlotId, SeasonId, VarietyId};
use agri_state::{Season, SeasonStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, season: &Season) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO seasons (id, season_name, status, start_date, planned_harvest_date, end_date,
                              expected_yield_kg, actual_yield_kg, initial_plant_count,
                              current_plant_count, notes, plot_id, crop_id, variety_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(season.id.0)
    .bind(&season.season_name)
    .bind(season.status.as_str())
    .bind(season.start_date)
    .bind(season.planned_harvest_date)
    .bind(season.end_date)
    .bind(season.expected_yield_kg)
    .bind(season.actual_yield_kg)
    .bind(season.initial_plant_count)
    .bind(season.current_plant_count)
    .bind(&season.notes)
    .bind(season.plot_id.map(|id| id.0))
    .bind(season.crop_id.map(|id| id.0))
    .bind(season.variety_id.map(|id| id.0))
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the mutable columns of a season. Returns `false` if no row matched.
pub async fn save(pool: &PgPool, season: &Season) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE seasons SET season_name = $1, status = $2, start_date = $3,
                planned_harvest_date = $4, end_date = $5, expected_yield_kg = $6,
                actual_yield_kg = $7, current_plant_count = $8, notes = $9
         WHERE id = $10",
    )
    .bind(&season.season_name)
    .bind(season.status.as_str())
    .bind(season.start_date)
    .bind(season.planned_harvest_date)
    .bind(season.end_date)
    .bind(season.expected_yield_kg)
    .bind(season.actual_yield_kg)
    .bind(season.current_plant_count)
    .bind(&season.notes)
    .bind(season.id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Season>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SeasonRow>(
        "SELECT id, season_name, status, start_date, planned_harvest_date, end_date,
                expected_yield_kg, actual_yield_kg, initial_plant_count, current_plant_count,
                notes, plot_id, crop_id, variety_id
         FROM seasons ORDER BY start_date NULLS LAST",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SeasonRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct SeasonRow {
    id: Uuid,
    season_name: String,
    status: String,
    start_date: Option<NaiveDate>,
    planned_harvest_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    expected_yield_kg: Option<Decimal>,
    actual_yield_kg: Option<Decimal>,
    initial_plant_count: Option<i32>,
    current_plant_count: Option<i32>,
    notes: Option<String>,
    plot_id: Option<Uuid>,
    crop_id: Option<Uuid>,
    variety_id: Option<Uuid>,
}

impl SeasonRow {
    fn into_record(self) -> Season {
        // Read path: an unknown status is logged at ERROR and loaded as
        // ARCHIVED, which blocks further edits until an operator looks at it.
        let status = SeasonStatus::from_name(&self.status).unwrap_or_else(|e| {
            tracing::error!(
                id = %self.id,
                status = %self.status,
                error = %e,
                "unknown season status in database, loading as ARCHIVED"
            );
            SeasonStatus::Archived
        });

        Season {
            id: SeasonId::from_uuid(self.id),
            season_name: self.season_name,
            status,
            start_date: self.start_date,
            planned_harvest_date: self.planned_harvest_date,
            end_date: self.end_date,
            expected_yield_kg: self.expected_yield_kg,
            actual_yield_kg: self.actual_yield_kg,
            initial_plant_count: self.initial_plant_count,
            current_plant_count: self.current_plant_count,
            notes: self.notes,
            plot_id: self.plot_id.map(PlotId::from_uuid),
            crop_id: self.crop_id.map(CropId::from_uuid),
            variety_id: self.variety_id.map(VarietyId::from_uuid),
        }
    }
}
