//! Business-day calendar helpers.
//!
//! "Business day" here means Monday–Friday. Exchange holidays are not
//! excluded from the axis; the cleaner forward-fills across them
//! instead, which is the contract the rest of the pipeline assumes.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::ops::Range;

/// True for Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// All business days from `start` to `end`, inclusive on both ends.
///
/// Returns an empty vec when `start > end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if is_business_day(current) {
            days.push(current);
        }
        current += Duration::days(1);
    }
    days
}

/// Partition a sorted date axis into calendar months.
///
/// Each entry is `((year, month), row_range)` where the range indexes
/// into the original slice. Used by the monthly-returns resampler.
pub fn month_partitions(dates: &[NaiveDate]) -> Vec<((i32, u32), Range<usize>)> {
    let mut parts: Vec<((i32, u32), Range<usize>)> = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        let key = (date.year(), date.month());
        match parts.last_mut() {
            Some((last_key, range)) if *last_key == key => range.end = i + 1,
            _ => parts.push((key, i..i + 1)),
        }
    }
    parts
}
