//! Calendar helpers for bucketing dates.

use chrono::{Datelike, NaiveDate};

/// Short English month names, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Week of the year with Sunday-start weeks.
///
/// Week 1 runs from January 1st up to the first Saturday. Computed as
/// `ceil((day_of_year0 + jan1_weekday + 1) / 7)` where `jan1_weekday` counts
/// from Sunday = 0. This is *not* the ISO 8601 week.
#[must_use]
pub fn week_of_year(date: NaiveDate) -> u32 {
    let ordinal0 = date.ordinal0();
    let weekday = date.weekday().num_days_from_sunday();
    let jan1_weekday = (weekday + 7 - ordinal0 % 7) % 7;
    (ordinal0 + jan1_weekday + 1).div_ceil(7)
}
