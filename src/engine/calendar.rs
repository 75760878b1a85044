//! Pure calendar helpers: working days, inclusive ranges, calendar months.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::engine::error::EngineError;

/// Monday through Friday.
pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in `[start, end]`. Zero when `start > end`.
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    working_days_excluding(start, end, &BTreeSet::new())
}

/// Weekdays in `[start, end]` that are not listed in `holidays`.
pub fn working_days_excluding(start: NaiveDate, end: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> u32 {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day) && !holidays.contains(day))
        .count() as u32
}

/// Closed-interval overlap.
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// `date` moved back by whole months, clamping to month end (29 Feb → 28 Feb).
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EngineError> {
        if end < start {
            return Err(EngineError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        ranges_overlap(self.start, self.end, start, end)
    }

    /// Number of calendar days, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::validation(format!("invalid month {}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first)
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.last_day(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::validation(format!("month must be YYYY-MM, got {:?}", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn single_day_counts_one_only_on_weekdays() {
        // 2025-03-10 is a Monday
        assert_eq!(working_days_between(d(2025, 3, 10), d(2025, 3, 10)), 1);
        assert_eq!(working_days_between(d(2025, 3, 15), d(2025, 3, 15)), 0); // Saturday
        assert_eq!(working_days_between(d(2025, 3, 16), d(2025, 3, 16)), 0); // Sunday
    }

    #[test]
    fn full_weeks_skip_weekends() {
        assert_eq!(working_days_between(d(2025, 3, 10), d(2025, 3, 16)), 5);
        assert_eq!(working_days_between(d(2025, 3, 14), d(2025, 3, 17)), 2); // Fri..Mon
        assert_eq!(working_days_between(d(2025, 3, 1), d(2025, 3, 31)), 21);
    }

    #[test]
    fn reversed_range_counts_zero() {
        assert_eq!(working_days_between(d(2025, 3, 12), d(2025, 3, 10)), 0);
    }

    #[test]
    fn holidays_are_excluded() {
        let holidays: BTreeSet<_> = [d(2025, 3, 11), d(2025, 3, 15)].into_iter().collect();
        assert_eq!(working_days_excluding(d(2025, 3, 10), d(2025, 3, 14), &holidays), 4);
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        assert!(ranges_overlap(d(2025, 3, 10), d(2025, 3, 12), d(2025, 3, 12), d(2025, 3, 14)));
        assert!(ranges_overlap(d(2025, 3, 12), d(2025, 3, 12), d(2025, 3, 10), d(2025, 3, 14)));
        assert!(!ranges_overlap(d(2025, 3, 10), d(2025, 3, 11), d(2025, 3, 12), d(2025, 3, 14)));
        assert!(!ranges_overlap(d(2025, 3, 15), d(2025, 3, 16), d(2025, 3, 10), d(2025, 3, 14)));
    }

    #[test]
    fn months_before_clamps_leap_day() {
        assert_eq!(months_before(d(2024, 2, 29), 12), d(2023, 2, 28));
        assert_eq!(months_before(d(2025, 5, 31), 3), d(2025, 2, 28));
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        assert!(matches!(
            DateRange::new(d(2025, 3, 12), d(2025, 3, 10)),
            Err(EngineError::Validation(_))
        ));
        let range = DateRange::new(d(2025, 3, 10), d(2025, 3, 12)).unwrap();
        assert_eq!(range.len_days(), 3);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d(2025, 3, 10), d(2025, 3, 11), d(2025, 3, 12)]);
    }

    #[test]
    fn year_month_parses_and_bounds() {
        let feb: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(feb.first_day(), d(2024, 2, 1));
        assert_eq!(feb.last_day(), d(2024, 2, 29));
        assert_eq!(feb.to_string(), "2024-02");
        assert_eq!(YearMonth::of(d(2025, 12, 31)).last_day(), d(2025, 12, 31));
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("march".parse::<YearMonth>().is_err());
    }
}
