//! Calendar arithmetic and the holiday table.
//!
//! # Week Model
//! Weeks start on Monday (ISO). The Monday date of a week doubles as its
//! key when bounding the weekly Off quota.
//!
//! # Holidays
//! [`Holidays`] is a read-only lookup consulted by presentation layers.
//! The engine itself never reads holiday labels.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|source| {
        ScheduleError::InvalidDate {
            input: input.to_string(),
            source,
        }
    })
}

/// All dates in `[start, end]`, ascending. Empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Monday of the week containing `date`.
#[inline]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `date`.
#[inline]
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// Whether two dates fall in the same Monday-start week.
#[inline]
pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    week_start(a) == week_start(b)
}

/// Date → label table of public holidays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holidays {
    entries: BTreeMap<NaiveDate, String>,
}

impl Holidays {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate, label: impl Into<String>) -> Self {
        self.entries.insert(date, label.into());
        self
    }

    /// Builds a table from ISO date strings.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (date, label) in pairs {
            entries.insert(parse_date(date)?, label.to_string());
        }
        Ok(Self { entries })
    }

    /// Indonesian national holidays for 2026.
    pub fn national_2026() -> Self {
        const TABLE: [(u32, u32, &str); 16] = [
            (1, 1, "Tahun Baru Masehi"),
            (1, 29, "Tahun Baru Imlek"),
            (3, 20, "Isra Miraj"),
            (3, 22, "Hari Suci Nyepi"),
            (4, 3, "Jumat Agung"),
            (5, 1, "Hari Buruh"),
            (5, 14, "Kenaikan Isa Almasih"),
            (5, 17, "Idul Fitri"),
            (5, 18, "Idul Fitri"),
            (5, 26, "Hari Waisak"),
            (6, 1, "Hari Lahir Pancasila"),
            (7, 24, "Idul Adha"),
            (8, 14, "Tahun Baru Hijriah"),
            (8, 17, "Hari Kemerdekaan RI"),
            (10, 23, "Maulid Nabi Muhammad"),
            (12, 25, "Hari Natal"),
        ];

        let entries = TABLE
            .iter()
            .filter_map(|&(m, d, label)| {
                NaiveDate::from_ymd_opt(2026, m, d).map(|date| (date, label.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Whether `date` is a holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    /// Holiday label for `date`.
    pub fn label(&self, date: NaiveDate) -> Option<&str> {
        self.entries.get(&date).map(String::as_str)
    }

    /// Holidays within `[start, end]`.
    pub fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &str)> + '_ {
        self.entries
            .range(start..=end)
            .map(|(d, l)| (*d, l.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(d("2026-02-28"), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(d(" 2026-01-05 "), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(matches!(
            parse_date("2026-02-30"),
            Err(ScheduleError::InvalidDate { .. })
        ));
        assert!(parse_date("05/01/2026").is_err());
    }

    #[test]
    fn test_date_range() {
        let range = date_range(d("2026-02-27"), d("2026-03-02"));
        assert_eq!(range.len(), 4);
        assert_eq!(range[1], d("2026-02-28"));
        assert_eq!(range[2], d("2026-03-01")); // no Feb 29 in 2026

        assert_eq!(date_range(d("2026-03-01"), d("2026-03-01")).len(), 1);
        assert!(date_range(d("2026-03-02"), d("2026-03-01")).is_empty());
    }

    #[test]
    fn test_week_start() {
        // 2026-01-05 is a Monday
        assert_eq!(week_start(d("2026-01-05")), d("2026-01-05"));
        assert_eq!(week_start(d("2026-01-08")), d("2026-01-05"));
        assert_eq!(week_start(d("2026-01-11")), d("2026-01-05")); // Sunday
        assert_eq!(week_start(d("2026-01-12")), d("2026-01-12"));
        // Week spanning the year boundary
        assert_eq!(week_start(d("2026-01-01")), d("2025-12-29"));
        assert_eq!(week_end(d("2026-01-01")), d("2026-01-04"));
    }

    #[test]
    fn test_week_boundaries() {
        assert!(same_week(d("2026-01-05"), d("2026-01-11")));
        assert!(!same_week(d("2026-01-11"), d("2026-01-12")));
    }

    #[test]
    fn test_national_holidays() {
        let h = Holidays::national_2026();
        assert_eq!(h.len(), 16);
        assert!(h.is_holiday(d("2026-08-17")));
        assert_eq!(h.label(d("2026-12-25")), Some("Hari Natal"));
        assert_eq!(h.label(d("2026-12-24")), None);

        let may: Vec<_> = h.in_range(d("2026-05-01"), d("2026-05-31")).collect();
        assert_eq!(may.len(), 5);
    }

    #[test]
    fn test_custom_holidays() {
        let h = Holidays::from_pairs([("2026-03-03", "Company day")]).unwrap();
        assert!(h.is_holiday(d("2026-03-03")));
        assert!(Holidays::from_pairs([("bad", "x")]).is_err());

        let h2 = Holidays::new().with_holiday(d("2026-04-04"), "Audit");
        assert_eq!(h2.label(d("2026-04-04")), Some("Audit"));
        assert!(Holidays::new().is_empty());
    }
}
