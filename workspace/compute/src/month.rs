//! Typed calendar-month filter.
//!
//! Records are restricted by calendar-month equality, never a rolling window.
//! Dates in this system are plain calendar dates (`NaiveDate`) as recorded,
//! so month membership is a field comparison with no timezone conversion.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::ComputeError;

/// An optional `YYYY-MM` restriction applied uniformly to meals, deposits,
/// and bazar expenses before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthFilter {
    year: i32,
    month: u32,
}

impl MonthFilter {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Whether `date` falls in this calendar month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// First day of the month, for range queries.
    pub fn first_day(&self) -> NaiveDate {
        // Month is validated on construction, so this cannot fail.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated year-month is representable")
    }

    /// Last day of the month, for range queries.
    pub fn last_day(&self) -> NaiveDate {
        // Get the first day of the next month, then subtract one day
        let next_month = if self.month == 12 { 1 } else { self.month + 1 };
        let next_year = if self.month == 12 { self.year + 1 } else { self.year };

        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .expect("validated year-month is representable")
            .pred_opt()
            .expect("first of month has a predecessor")
    }
}

impl FromStr for MonthFilter {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ComputeError::Month(format!("expected YYYY-MM, got '{s}'"));

        let (year_part, month_part) = s.split_once('-').ok_or_else(invalid)?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        MonthFilter::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let filter: MonthFilter = "2024-03".parse().unwrap();
        assert_eq!(filter.year(), 2024);
        assert_eq!(filter.month(), 3);
        assert_eq!(filter.to_string(), "2024-03");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("2024".parse::<MonthFilter>().is_err());
        assert!("2024-13".parse::<MonthFilter>().is_err());
        assert!("2024-00".parse::<MonthFilter>().is_err());
        assert!("24-03".parse::<MonthFilter>().is_err());
        assert!("2024-3".parse::<MonthFilter>().is_err());
        assert!("2024-03-01".parse::<MonthFilter>().is_err());
        assert!("abcd-ef".parse::<MonthFilter>().is_err());
    }

    #[test]
    fn test_contains_is_calendar_month_equality() {
        let filter = MonthFilter::new(2024, 2).unwrap();
        assert!(filter.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(filter.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!filter.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(!filter.contains(NaiveDate::from_ymd_opt(2023, 2, 15).unwrap()));
    }

    #[test]
    fn test_day_bounds() {
        let jan = MonthFilter::new(2023, 1).unwrap();
        assert_eq!(jan.first_day(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(jan.last_day(), NaiveDate::from_ymd_opt(2023, 1, 31).unwrap());

        // Leap year
        let feb = MonthFilter::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = MonthFilter::new(2023, 12).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
