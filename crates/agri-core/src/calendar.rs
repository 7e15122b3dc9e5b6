//! # Calendar Helpers
//!
//! Quarter arithmetic for season naming and closed date ranges for overlap
//! detection between seasons on the same plot.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar quarter (1-4) of a date: `floor((month - 1) / 3) + 1`.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// A date range with an inclusive start and an optional inclusive end.
///
/// An absent end means the range is open and extends indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range. An end before the start is treated as the start itself.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end: end.map(|e| e.max(start)),
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }

    /// Whether the two ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let self_before_other = self.end.is_some_and(|end| end < other.start);
        let other_before_self = other.end.is_some_and(|end| end < self.start);
        !(self_before_other || other_before_self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(quarter_of(d(2025, 1, 1)), 1);
        assert_eq!(quarter_of(d(2025, 3, 31)), 1);
        assert_eq!(quarter_of(d(2025, 4, 1)), 2);
        assert_eq!(quarter_of(d(2025, 6, 30)), 2);
        assert_eq!(quarter_of(d(2025, 7, 1)), 3);
        assert_eq!(quarter_of(d(2025, 10, 1)), 4);
        assert_eq!(quarter_of(d(2025, 12, 31)), 4);
    }

    #[test]
    fn closed_ranges_overlap() {
        let a = DateRange::new(d(2025, 1, 1), Some(d(2025, 3, 31)));
        let b = DateRange::new(d(2025, 3, 31), Some(d(2025, 6, 30)));
        let c = DateRange::new(d(2025, 4, 1), Some(d(2025, 6, 30)));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn open_range_overlaps_everything_after_start() {
        let open = DateRange::new(d(2025, 5, 1), None);
        let later = DateRange::new(d(2030, 1, 1), Some(d(2030, 2, 1)));
        let earlier = DateRange::new(d(2025, 1, 1), Some(d(2025, 4, 30)));
        assert!(open.overlaps(&later));
        assert!(!open.overlaps(&earlier));
        assert!(open.overlaps(&DateRange::new(d(2020, 1, 1), None)));
    }

    #[test]
    fn end_before_start_is_clamped() {
        let r = DateRange::new(d(2025, 5, 10), Some(d(2025, 5, 1)));
        assert_eq!(r.end, Some(d(2025, 5, 10)));
        assert!(r.contains(d(2025, 5, 10)));
        assert!(!r.contains(d(2025, 5, 11)));
    }
}
