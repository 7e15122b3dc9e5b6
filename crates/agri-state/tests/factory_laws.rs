//! Laws of season and task creation, checked over generated inputs.

use agri_core::{quarter_of, User, UserRole};
use agri_state::{
    EntityFactory, SeasonFactory, SeasonRequest, SeasonStatus, StatusTransitionStrategy,
    TaskFactory, TaskRequest, TaskStatus,
};
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn creator() -> User {
    User::new("thu", "Pham Thu", UserRole::Farmer)
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn blank() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[ \t]{0,6}".prop_map(Some)]
}

proptest! {
    /// A non-blank name survives creation unchanged.
    #[test]
    fn non_blank_name_is_identity(name in "[ ]{0,2}[A-Za-z0-9][A-Za-z0-9 -]{0,30}", start in proptest::option::of(any_date())) {
        let req = SeasonRequest { season_name: Some(name.clone()), start_date: start, ..Default::default() };
        let season = SeasonFactory::new().create(&req, &creator());
        prop_assert_eq!(season.season_name, name);
    }

    /// A blank name with a start date becomes "Season Q{q} {y}".
    #[test]
    fn blank_name_uses_quarter_and_year(name in blank(), start in any_date()) {
        let req = SeasonRequest { season_name: name, start_date: Some(start), ..Default::default() };
        let season = SeasonFactory::new().create(&req, &creator());
        let q = (start.month() - 1) / 3 + 1;
        prop_assert_eq!(q, quarter_of(start));
        prop_assert_eq!(season.season_name, format!("Season Q{} {}", q, start.year()));
    }

    /// Status is the strategy's initial status whatever the request holds.
    #[test]
    fn status_is_always_initial(
        name in proptest::option::of("[a-z ]{0,12}"),
        start in proptest::option::of(any_date()),
        plants in proptest::option::of(0i32..100_000),
        yield_kg in proptest::option::of(0i64..10_000_000),
    ) {
        let factory = SeasonFactory::new();
        let req = SeasonRequest {
            season_name: name,
            start_date: start,
            expected_yield_kg: yield_kg.map(|y| Decimal::new(y, 2)),
            initial_plant_count: plants,
            ..Default::default()
        };
        let season = factory.create(&req, &creator());
        prop_assert_eq!(season.status, factory.strategy().initial_status());
        prop_assert_eq!(season.status, SeasonStatus::Planned);
        prop_assert_eq!(season.current_plant_count, season.initial_plant_count);
        prop_assert_eq!(season.initial_plant_count, plants);
        prop_assert_eq!(season.expected_yield_kg, req.expected_yield_kg);
    }

    /// Every task belongs to whoever created it.
    #[test]
    fn task_owner_is_creator(title in "[A-Za-z ]{1,40}", role in prop_oneof![Just(UserRole::Farmer), Just(UserRole::Admin)]) {
        let user = User::new("u", "U", role);
        let task = TaskFactory::new().create(&TaskRequest { title, ..Default::default() }, &user);
        prop_assert_eq!(task.owner_id, user.id);
        prop_assert_eq!(task.status, TaskStatus::Pending);
    }
}

#[test]
fn no_name_no_date_is_new_season() {
    let season = SeasonFactory::new().create(&SeasonRequest::default(), &creator());
    assert_eq!(season.season_name, "New Season");
}

#[test]
fn end_to_end_creation_scenario() {
    let req = SeasonRequest {
        season_name: None,
        start_date: NaiveDate::from_ymd_opt(2025, 4, 10),
        expected_yield_kg: None,
        initial_plant_count: Some(50),
        ..Default::default()
    };
    let season = SeasonFactory::new().create(&req, &creator());
    assert_eq!(season.season_name, "Season Q2 2025");
    assert_eq!(season.status, SeasonStatus::Planned);
    assert_eq!(season.expected_yield_kg, None);
    assert_eq!(season.initial_plant_count, Some(50));
    assert_eq!(season.current_plant_count, Some(50));
}

#[test]
fn season_json_shape() {
    let req = SeasonRequest {
        start_date: NaiveDate::from_ymd_opt(2025, 4, 10),
        initial_plant_count: Some(50),
        ..Default::default()
    };
    let season = SeasonFactory::new().create(&req, &creator());
    let json = serde_json::to_value(&season).unwrap();
    assert_eq!(json["season_name"], "Season Q2 2025");
    assert_eq!(json["status"], "PLANNED");
    assert_eq!(json["start_date"], "2025-04-10");
    assert!(json["expected_yield_kg"].is_null());
    assert_eq!(json["current_plant_count"], 50);
}
