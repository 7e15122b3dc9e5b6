//! # Season
//!
//! A cultivation cycle on one plot: from planting through harvest.
//! Seasons are built by [`SeasonFactory`](crate::factory::SeasonFactory),
//! mutated by later updates and status changes, and never deleted.

use agri_core::{CropId, DateRange, PlotId, SeasonId, VarietyId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::SeasonStatus;

/// Payload a season is created from.
///
/// Every field is optional here. Whether a field is mandatory is decided by
/// the caller before the factory runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRequest {
    pub season_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub initial_plant_count: Option<i32>,
    pub notes: Option<String>,
}

/// A cultivation season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub season_name: String,
    pub status: SeasonStatus,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub actual_yield_kg: Option<Decimal>,
    pub initial_plant_count: Option<i32>,
    pub current_plant_count: Option<i32>,
    pub notes: Option<String>,
    pub plot_id: Option<PlotId>,
    pub crop_id: Option<CropId>,
    pub variety_id: Option<VarietyId>,
}

impl Season {
    /// The last day the season occupies its plot: the actual end date if
    /// recorded, otherwise the planned harvest date.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or(self.planned_harvest_date)
    }

    /// The span of days the season occupies its plot. `None` when the
    /// season has no start date yet.
    pub fn date_range(&self) -> Option<DateRange> {
        self.start_date
            .map(|start| DateRange::new(start, self.effective_end()))
    }

    /// Whether this season takes part in overlap checks.
    pub fn occupies_plot(&self) -> bool {
        self.status != SeasonStatus::Cancelled
    }
}

/// Partial update of a season's editable details.
///
/// `None` leaves the field unchanged. Status is changed only through the
/// transition path, and plot / crop / variety are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonUpdate {
    pub season_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub actual_yield_kg: Option<Decimal>,
    pub current_plant_count: Option<i32>,
    pub notes: Option<String>,
}

impl SeasonUpdate {
    /// Apply to `season`. A blank name is ignored.
    pub fn apply_to(&self, season: &mut Season) {
        if let Some(name) = self.season_name.as_deref() {
            if !name.trim().is_empty() {
                season.season_name = name.to_string();
            }
        }
        if let Some(d) = self.start_date {
            season.start_date = Some(d);
        }
        if let Some(d) = self.planned_harvest_date {
            season.planned_harvest_date = Some(d);
        }
        if let Some(d) = self.end_date {
            season.end_date = Some(d);
        }
        if let Some(y) = self.expected_yield_kg {
            season.expected_yield_kg = Some(y);
        }
        if let Some(y) = self.actual_yield_kg {
            season.actual_yield_kg = Some(y);
        }
        if let Some(c) = self.current_plant_count {
            season.current_plant_count = Some(c);
        }
        if let Some(n) = &self.notes {
            season.notes = Some(n.clone());
        }
    }
}
