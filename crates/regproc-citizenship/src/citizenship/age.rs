use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar period between two dates of birth, counted by anniversaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGap {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl AgeGap {
    /// Period from `earlier` to `later`. Components are negative when `later` precedes `earlier`.
    pub fn between(earlier: NaiveDate, later: NaiveDate) -> Self {
        let mut total_months = month_index(later) - month_index(earlier);
        let mut days = later.day() as i32 - earlier.day() as i32;

        if total_months > 0 && days < 0 {
            total_months -= 1;
            days = match earlier.checked_add_months(Months::new(total_months as u32)) {
                Some(anchor) => (later - anchor).num_days() as i32,
                None => days,
            };
        } else if total_months < 0 && days > 0 {
            total_months += 1;
            days -= days_in_month(later);
        }

        Self {
            years: (total_months / 12) as i32,
            months: (total_months % 12) as i32,
            days,
        }
    }
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn days_in_month(date: NaiveDate) -> i32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day() as i32)
        .unwrap_or(31)
}

/// Whole years between two dates of birth.
pub fn years_between(earlier: NaiveDate, later: NaiveDate) -> i32 {
    AgeGap::between(earlier, later).years
}

/// `true` when `later` was born at least `years` full years after `earlier`.
pub fn gap_at_least(earlier: NaiveDate, later: NaiveDate, years: u32) -> bool {
    i64::from(years_between(earlier, later)) >= i64::from(years)
}
