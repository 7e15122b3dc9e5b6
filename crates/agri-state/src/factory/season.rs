use agri_core::{quarter_of, Crop, Plot, User, Variety};
use chrono::{Datelike, NaiveDate};

use super::EntityFactory;
use crate::season::{Season, SeasonRequest};
use crate::status::{SeasonStatus, SeasonStatusPolicy, StatusTransitionStrategy};

/// Name given to a season created without a name or a start date.
pub const FALLBACK_SEASON_NAME: &str = "New Season";

/// Name for a season created without one: `"Season Q{quarter} {year}"`
/// of the start date, or [`FALLBACK_SEASON_NAME`] without a start date.
pub fn default_season_name(start_date: Option<NaiveDate>) -> String {
    match start_date {
        Some(date) => format!("Season Q{} {}", quarter_of(date), date.year()),
        None => FALLBACK_SEASON_NAME.to_string(),
    }
}

/// Builds [`Season`]s. The initial status comes from the strategy `S`.
#[derive(Debug, Clone)]
pub struct SeasonFactory<S = SeasonStatusPolicy> {
    strategy: S,
}

impl SeasonFactory {
    pub fn new() -> Self {
        Self {
            strategy: SeasonStatusPolicy,
        }
    }
}

impl Default for SeasonFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SeasonFactory<S>
where
    S: StatusTransitionStrategy<SeasonStatus>,
{
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// [`create`](EntityFactory::create), then attach the plot, crop and
    /// variety by id. No existence or ownership checks happen here.
    pub fn create_with_entities(
        &self,
        request: &SeasonRequest,
        creator: &User,
        plot: &Plot,
        crop: &Crop,
        variety: Option<&Variety>,
    ) -> Season {
        let mut season = self.create(request, creator);
        season.plot_id = Some(plot.id);
        season.crop_id = Some(crop.id);
        season.variety_id = variety.map(|v| v.id);
        season
    }
}

impl<S> EntityFactory<Season, SeasonRequest> for SeasonFactory<S>
where
    S: StatusTransitionStrategy<SeasonStatus>,
{
    /// `creator` is not stored: a season has no audit field for it.
    fn create(&self, request: &SeasonRequest, _creator: &User) -> Season {
        let season_name = match request.season_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => default_season_name(request.start_date),
        };

        Season {
            id: agri_core::SeasonId::new(),
            season_name,
            status: self.strategy.initial_status(),
            start_date: request.start_date,
            planned_harvest_date: request.planned_harvest_date,
            end_date: request.end_date,
            expected_yield_kg: request.expected_yield_kg,
            actual_yield_kg: None,
            initial_plant_count: request.initial_plant_count,
            current_plant_count: request.initial_plant_count,
            notes: request.notes.clone(),
            plot_id: None,
            crop_id: None,
            variety_id: None,
        }
    }
}
