//! Crop and variety persistence.
//!
//! Varieties live in their own table but are only ever written alongside
//! the crop catalog, so both share this module.

use agri_core::{Crop, CropId, Variety, VarietyId};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, crop: &Crop) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO crops (id, crop_name, description) VALUES ($1, $2, $3)")
        .bind(crop.id.0)
        .bind(&crop.crop_name)
        .bind(&crop.description)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Crop>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CropRow>(
        "SELECT id, crop_name, description FROM crops ORDER BY crop_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CropRow::into_record).collect())
}

pub async fn insert_variety(pool: &PgPool, variety: &Variety) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO varieties (id, crop_id, variety_name, description) VALUES ($1, $2, $3, $4)",
    )
    .bind(variety.id.0)
    .bind(variety.crop_id.0)
    .bind(&variety.variety_name)
    .bind(&variety.description)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_all_varieties(pool: &PgPool) -> Result<Vec<Variety>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VarietyRow>(
        "SELECT id, crop_id, variety_name, description FROM varieties ORDER BY variety_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(VarietyRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct CropRow {
    id: Uuid,
    crop_name: String,
    description: Option<String>,
}

impl CropRow {
    fn into_record(self) -> Crop {
        Crop {
            id: CropId::from_uuid(self.id),
            crop_name: self.crop_name,
            description: self.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VarietyRow {
    id: Uuid,
    crop_id: Uuid,
    variety_name: String,
    description: Option<String>,
}

impl VarietyRow {
    fn into_record(self) -> Variety {
        Variety {
            id: VarietyId::from_uuid(self.id),
            crop_id: CropId::from_uuid(self.crop_id),
            variety_name: self.variety_name,
            description: self.description,
        }
    }
}
