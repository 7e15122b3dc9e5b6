//! # Season Rules
//!
//! Checks that need more than the season itself:
//!
//! - no two seasons on one plot share a name (trimmed, case-insensitive);
//! - no two non-cancelled seasons on one plot overlap in dates. A season
//!   occupies its plot from `start_date` to its effective end (actual end
//!   date, else planned harvest date); without either it is open-ended.
//!
//! Date ordering within one season is checked separately by
//! [`check_season_dates`] and reported per field.

use agri_core::{FieldErrors, MessageCode, SeasonId};
use chrono::NaiveDate;
use thiserror::Error;

use crate::season::Season;

/// A season that conflicts with its siblings on the same plot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("season name \"{name}\" is already used on this plot")]
    DuplicateName { name: String, existing: SeasonId },

    #[error("season dates overlap season {existing}")]
    DateOverlap { existing: SeasonId },
}

impl RuleViolation {
    pub fn message_code(&self) -> MessageCode {
        match self {
            Self::DuplicateName { .. } => MessageCode::SeasonNameDuplicate,
            Self::DateOverlap { .. } => MessageCode::SeasonDateOverlap,
        }
    }
}

fn normalized(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check `candidate` against the other seasons on its plot.
///
/// `siblings` may include `candidate` itself (matched by id and skipped),
/// so the same call serves creates and updates. Seasons on other plots are
/// ignored.
pub fn check_season_rules<'a>(
    candidate: &Season,
    siblings: impl IntoIterator<Item = &'a Season>,
) -> Result<(), RuleViolation> {
    let name = normalized(&candidate.season_name);
    let range = candidate.date_range().filter(|_| candidate.occupies_plot());

    for other in siblings {
        if other.id == candidate.id || other.plot_id != candidate.plot_id {
            continue;
        }
        if normalized(&other.season_name) == name {
            return Err(RuleViolation::DuplicateName {
                name: candidate.season_name.clone(),
                existing: other.id,
            });
        }
        if !other.occupies_plot() {
            continue;
        }
        if let (Some(mine), Some(theirs)) = (range, other.date_range()) {
            if mine.overlaps(&theirs) {
                return Err(RuleViolation::DateOverlap { existing: other.id });
            }
        }
    }
    Ok(())
}

/// Ordering of a season's own dates: the planned harvest and the end date
/// may not precede the start date.
pub fn check_season_dates(
    start_date: Option<NaiveDate>,
    planned_harvest_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(start) = start_date {
        if planned_harvest_date.is_some_and(|h| h < start) {
            errors.invalid("planned_harvest_date", "must not be before start_date");
        }
        if end_date.is_some_and(|e| e < start) {
            errors.invalid("end_date", "must not be before start_date");
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SeasonStatus;
    use agri_core::PlotId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn season(plot: PlotId, name: &str, start: NaiveDate, harvest: Option<NaiveDate>) -> Season {
        Season {
            id: SeasonId::new(),
            season_name: name.into(),
            status: SeasonStatus::Planned,
            start_date: Some(start),
            planned_harvest_date: harvest,
            end_date: None,
            expected_yield_kg: None,
            actual_yield_kg: None,
            initial_plant_count: None,
            current_plant_count: None,
            notes: None,
            plot_id: Some(plot),
            crop_id: None,
            variety_id: None,
        }
    }

    #[test]
    fn duplicate_name_is_case_insensitive() {
        let plot = PlotId::new();
        let a = season(plot, "Spring Rice", d(2025, 1, 1), Some(d(2025, 3, 1)));
        let b = season(plot, "  spring rice ", d(2025, 6, 1), Some(d(2025, 8, 1)));
        let err = check_season_rules(&b, [&a]).unwrap_err();
        assert_eq!(err.message_code(), MessageCode::SeasonNameDuplicate);
    }

    #[test]
    fn same_name_on_other_plot_is_fine() {
        let a = season(PlotId::new(), "Spring Rice", d(2025, 1, 1), Some(d(2025, 3, 1)));
        let b = season(PlotId::new(), "Spring Rice", d(2025, 1, 1), Some(d(2025, 3, 1)));
        assert!(check_season_rules(&b, [&a]).is_ok());
    }

    #[test]
    fn overlapping_dates_are_rejected() {
        let plot = PlotId::new();
        let a = season(plot, "A", d(2025, 1, 1), Some(d(2025, 4, 10)));
        let b = season(plot, "B", d(2025, 4, 10), Some(d(2025, 7, 1)));
        let err = check_season_rules(&b, [&a]).unwrap_err();
        assert_eq!(err, RuleViolation::DateOverlap { existing: a.id });
        assert_eq!(err.message_code(), MessageCode::SeasonDateOverlap);
    }

    #[test]
    fn open_ended_season_blocks_later_ones() {
        let plot = PlotId::new();
        let a = season(plot, "A", d(2025, 1, 1), None);
        let b = season(plot, "B", d(2026, 1, 1), Some(d(2026, 3, 1)));
        assert!(check_season_rules(&b, [&a]).is_err());
        let earlier = season(plot, "C", d(2024, 1, 1), Some(d(2024, 12, 31)));
        assert!(check_season_rules(&earlier, [&a]).is_ok());
    }

    #[test]
    fn cancelled_seasons_do_not_block_dates() {
        let plot = PlotId::new();
        let mut a = season(plot, "A", d(2025, 1, 1), Some(d(2025, 6, 1)));
        a.status = SeasonStatus::Cancelled;
        let b = season(plot, "B", d(2025, 2, 1), Some(d(2025, 5, 1)));
        assert!(check_season_rules(&b, [&a]).is_ok());
        // names still collide
        let c = season(plot, "a", d(2026, 1, 1), None);
        assert!(check_season_rules(&c, [&a]).is_err());
    }

    #[test]
    fn candidate_is_skipped_in_siblings() {
        let plot = PlotId::new();
        let a = season(plot, "A", d(2025, 1, 1), Some(d(2025, 6, 1)));
        assert!(check_season_rules(&a, [&a]).is_ok());
    }

    #[test]
    fn dates_must_not_precede_start() {
        assert!(check_season_dates(Some(d(2025, 3, 1)), Some(d(2025, 6, 1)), None).is_ok());
        let errs = check_season_dates(Some(d(2025, 3, 1)), Some(d(2025, 2, 1)), Some(d(2025, 1, 1)))
            .unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.code(), MessageCode::InvalidFormat);
        assert!(check_season_dates(None, Some(d(2025, 2, 1)), None).is_ok());
    }
}
