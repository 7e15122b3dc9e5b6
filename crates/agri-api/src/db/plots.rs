//! Plot persistence.

use agri_core::{Plot, PlotId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, plot: &Plot) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO plots (id, plot_name, area_m2, soil_type, owner_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(plot.id.0)
    .bind(&plot.plot_name)
    .bind(plot.area_m2)
    .bind(&plot.soil_type)
    .bind(plot.owner_id.0)
    .bind(plot.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Plot>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PlotRow>(
        "SELECT id, plot_name, area_m2, soil_type, owner_id, created_at
         FROM plots ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PlotRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct PlotRow {
    id: Uuid,
    plot_name: String,
    area_m2: Option<Decimal>,
    soil_type: Option<String>,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
}

impl PlotRow {
    fn into_record(self) -> Plot {
        Plot {
            id: PlotId::from_uuid(self.id),
            plot_name: self.plot_name,
            area_m2: self.area_m2,
            soil_type: self.soil_type,
            owner_id: UserId::from_uuid(self.owner_id),
            created_at: self.created_at,
        }
    }
}
