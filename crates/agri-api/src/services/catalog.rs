//! Users, plots, crops and varieties.
//!
//! Role checks happen in the route handlers; these functions only enforce
//! visibility and uniqueness.

use agri_core::{Crop, CropId, MessageCode, Plot, PlotId, User, UserId, UserRole, UserStatus, Variety};
use rust_decimal::Decimal;

use super::{name_key, persist_error, row_written};
use crate::error::AppError;
use crate::mail;
use crate::state::{AppState, BOOTSTRAP_ADMIN_ID};

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

/// Register an account. Usernames are unique, ignoring case.
pub async fn create_user(state: &AppState, new: NewUser) -> Result<User, AppError> {
    let mut user = User::new(new.username.trim(), new.full_name.trim(), new.role);
    user.email = new.email;

    let key = name_key(&user.username);
    state.users.with_write(|users| {
        if users.values().any(|u| name_key(&u.username) == key) {
            return Err(AppError::Conflict(format!(
                "username \"{}\" is already taken",
                user.username
            )));
        }
        users.insert(user.id.0, user.clone());
        Ok(())
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::insert(pool, &user).await {
            state.users.remove(&user.id.0);
            return Err(persist_error("user", user.id, e));
        }
    }

    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    if let Some(message) = mail::welcome_message(&user) {
        mail::deliver(state.mailer.as_ref(), message).await;
    }
    Ok(user)
}

/// Admins see every account; other users only their own.
pub fn get_user(state: &AppState, actor: &User, id: UserId) -> Result<User, AppError> {
    state
        .users
        .get(id.as_uuid())
        .filter(|u| actor.is_admin() || u.id == actor.id)
        .ok_or(AppError::NotFound(MessageCode::UserNotFound))
}

/// Activate or deactivate an account. The bootstrap administrator cannot
/// be changed.
pub async fn set_user_status(state: &AppState, id: UserId, status: UserStatus) -> Result<User, AppError> {
    if id == BOOTSTRAP_ADMIN_ID {
        return Err(AppError::Conflict(
            "the bootstrap administrator cannot be modified".to_string(),
        ));
    }

    let (previous, updated) = state
        .users
        .update_returning(id.as_uuid(), |u| u.status = status)
        .ok_or(AppError::NotFound(MessageCode::UserNotFound))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::users::update_status(pool, id, status).await) {
            state.users.restore_if_unchanged(id.as_uuid(), &updated, previous);
            return Err(persist_error("user", id, e));
        }
    }

    tracing::info!(user_id = %id, status = %status, "user status changed");
    Ok(updated)
}

// ── Plots ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewPlot {
    pub plot_name: String,
    pub area_m2: Option<Decimal>,
    pub soil_type: Option<String>,
}

/// Create a plot owned by `actor`.
pub async fn create_plot(state: &AppState, actor: &User, new: NewPlot) -> Result<Plot, AppError> {
    let mut plot = Plot::new(new.plot_name.trim(), actor.id);
    plot.area_m2 = new.area_m2;
    plot.soil_type = new.soil_type;

    state.plots.insert(plot.id.0, plot.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::plots::insert(pool, &plot).await {
            state.plots.remove(&plot.id.0);
            return Err(persist_error("plot", plot.id, e));
        }
    }
    Ok(plot)
}

pub fn get_plot(state: &AppState, actor: &User, id: PlotId) -> Result<Plot, AppError> {
    state
        .plots
        .get(id.as_uuid())
        .filter(|p| actor.is_admin() || p.owner_id == actor.id)
        .ok_or(AppError::NotFound(MessageCode::PlotNotFound))
}

/// Plots visible to `actor`, by name.
pub fn list_plots(state: &AppState, actor: &User) -> Vec<Plot> {
    let mut plots = state
        .plots
        .filter(|p| actor.is_admin() || p.owner_id == actor.id);
    plots.sort_by(|a, b| a.plot_name.cmp(&b.plot_name).then(a.created_at.cmp(&b.created_at)));
    plots
}

// ── Crops and varieties ──────────────────────────────────────────────

pub async fn create_crop(
    state: &AppState,
    crop_name: &str,
    description: Option<String>,
) -> Result<Crop, AppError> {
    let mut crop = Crop::new(crop_name.trim());
    crop.description = description;

    let key = name_key(&crop.crop_name);
    state.crops.with_write(|crops| {
        if crops.values().any(|c| name_key(&c.crop_name) == key) {
            return Err(AppError::Conflict(format!(
                "crop \"{}\" already exists",
                crop.crop_name
            )));
        }
        crops.insert(crop.id.0, crop.clone());
        Ok(())
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::crops::insert(pool, &crop).await {
            state.crops.remove(&crop.id.0);
            return Err(persist_error("crop", crop.id, e));
        }
    }
    Ok(crop)
}

pub fn get_crop(state: &AppState, id: CropId) -> Result<Crop, AppError> {
    state
        .crops
        .get(id.as_uuid())
        .ok_or(AppError::NotFound(MessageCode::CropNotFound))
}

pub fn list_crops(state: &AppState) -> Vec<Crop> {
    let mut crops = state.crops.list();
    crops.sort_by(|a, b| a.crop_name.cmp(&b.crop_name));
    crops
}

/// Add a variety to a crop. Names are unique within one crop.
pub async fn create_variety(
    state: &AppState,
    crop_id: CropId,
    variety_name: &str,
    description: Option<String>,
) -> Result<Variety, AppError> {
    let crop = get_crop(state, crop_id)?;
    let mut variety = Variety::new(crop.id, variety_name.trim());
    variety.description = description;

    let key = name_key(&variety.variety_name);
    state.varieties.with_write(|varieties| {
        if varieties
            .values()
            .any(|v| v.crop_id == crop.id && name_key(&v.variety_name) == key)
        {
            return Err(AppError::Conflict(format!(
                "variety \"{}\" already exists for {}",
                variety.variety_name, crop.crop_name
            )));
        }
        varieties.insert(variety.id.0, variety.clone());
        Ok(())
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::crops::insert_variety(pool, &variety).await {
            state.varieties.remove(&variety.id.0);
            return Err(persist_error("variety", variety.id, e));
        }
    }
    Ok(variety)
}

pub fn list_varieties(state: &AppState, crop_id: CropId) -> Result<Vec<Variety>, AppError> {
    let crop = get_crop(state, crop_id)?;
    let mut varieties = state.varieties.filter(|v| v.crop_id == crop.id);
    varieties.sort_by(|a, b| a.variety_name.cmp(&b.variety_name));
    Ok(varieties)
}
