//! Calendar month periods.

use core::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Error returned for a month outside 1-12 or a year chrono cannot represent.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid month {month} of year {year}")]
pub struct InvalidYearMonth {
    pub year: i32,
    pub month: u32,
}

/// A calendar month, e.g. March 2026.
///
/// Budgets are keyed by it and the month views of the calendar and budget
/// pages navigate by it. Its date range is half-open:
/// `[first_day, next().first_day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl YearMonth {
    /// Create a period from a year and a 1-based month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYearMonth` if `month` is not in 1-12 or the first day
    /// of the month is not representable.
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidYearMonth> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(InvalidYearMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The 1-based month number.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// English month name, e.g. `March`.
    #[must_use]
    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    /// The first day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The last day of the month.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    /// The following month.
    #[must_use]
    pub fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map_or(*self, Self::containing)
    }

    /// The preceding month.
    #[must_use]
    pub fn previous(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map_or(*self, Self::containing)
    }

    /// Returns `true` if `date` falls inside this month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// English name for a 1-based month number, or `""` when out of range.
#[must_use]
pub fn month_name(month: u32) -> &'static str {
    usize::try_from(month)
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTH_NAMES.get(i))
        .copied()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_month() {
        assert!(YearMonth::new(2026, 0).is_err());
        assert!(YearMonth::new(2026, 13).is_err());
        assert!(YearMonth::new(2026, 12).is_ok());
    }

    #[test]
    fn test_range_and_navigation_across_year_end() {
        let december = YearMonth::new(2025, 12).unwrap();
        assert_eq!(december.first_day(), date(2025, 12, 1));
        assert_eq!(december.last_day(), date(2025, 12, 31));
        assert_eq!(december.next(), YearMonth::new(2026, 1).unwrap());
        assert_eq!(december.next().previous(), december);
    }

    #[test]
    fn test_last_day_of_february() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().last_day(), date(2024, 2, 29));
        assert_eq!(YearMonth::new(2026, 2).unwrap().last_day(), date(2026, 2, 28));
    }

    #[test]
    fn test_display_and_names() {
        assert_eq!(YearMonth::new(2026, 3).unwrap().to_string(), "March 2026");
        assert_eq!(month_name(0), "");
        assert_eq!(month_name(12), "December");
    }

    #[test]
    fn test_contains() {
        let march = YearMonth::containing(date(2026, 3, 15));
        assert!(march.contains(date(2026, 3, 31)));
        assert!(!march.contains(date(2026, 4, 1)));
    }
}
