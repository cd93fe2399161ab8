//! Resolve a week label from the weekly chart back into a calendar range.
//!
//! Accepted label forms, tried in order:
//!   - ISO week, year and week in either order: `2024-W05`, `2024 W5`,
//!     `W5 2024`, `Week 5 2024`
//!   - ISO calendar date: `2024-03-04`, `2024/03/04`
//!   - Day/month/year: `04/03/2024`
//!
//! Date forms start a seven-day range on the given day. Week forms start on
//! the ISO Monday of that week.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::Unresolved;
use crate::finance::{DateRange, WeekPoint};
use crate::time::parse_calendar_date;

/// Earliest year a week label may name.
pub const MIN_YEAR: i32 = 1970;
pub const MAX_WEEK: u32 = 53;

/// Compiled label patterns. Build once and share; resolution takes `&self`.
#[derive(Debug, Clone)]
pub struct WeekLabelResolver {
    year_week: Regex,
    week_year: Regex,
    iso_date: Regex,
    day_month_year: Regex,
}

impl WeekLabelResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            year_week: Regex::new(concat!(
                r"(?i)^(?P<year>[0-9]{4})",
                r"(?:[\s-]*w(?:eek)?[\s-]*|[\s-]+)",
                r"(?P<week>[0-9]{1,2})$"
            ))?,
            week_year: Regex::new(concat!(
                r"(?i)^(?:w(?:eek)?[\s-]*)?",
                r"(?P<week>[0-9]{1,2})[\s,-]+",
                r"(?P<year>[0-9]{4})$"
            ))?,
            iso_date: Regex::new(
                r"^(?P<year>[0-9]{4})[-/](?P<month>[0-9]{1,2})[-/](?P<day>[0-9]{1,2})$",
            )?,
            day_month_year: Regex::new(
                r"^(?P<day>[0-9]{1,2})/(?P<month>[0-9]{1,2})/(?P<year>[0-9]{4})$",
            )?,
        })
    }

    /// Resolve a chart label and/or point into a date range.
    ///
    /// Explicit `start`/`end` on the point win over any label text. Without a
    /// `label`, the point's own `week` label is parsed.
    pub fn resolve(
        &self,
        label: Option<&str>,
        point: Option<&WeekPoint>,
    ) -> Result<DateRange, Unresolved> {
        if let Some(range) = point.and_then(explicit_range) {
            debug!(%range, "using explicit week bounds");
            return Ok(range);
        }

        let label = label
            .or_else(|| point.map(|p| p.week.as_str()))
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(Unresolved::NoLabel)?;

        self.resolve_label(label)
    }

    /// Parse label text alone.
    pub fn resolve_label(&self, label: &str) -> Result<DateRange, Unresolved> {
        let label = label.trim();

        if let Some(caps) = self
            .year_week
            .captures(label)
            .or_else(|| self.week_year.captures(label))
        {
            let year: i32 = field(&caps, "year", label)?;
            let week: u32 = field(&caps, "week", label)?;
            debug!(label, year, week, "matched ISO week label");
            return week_range(year, week);
        }

        for pattern in [&self.iso_date, &self.day_month_year] {
            if let Some(caps) = pattern.captures(label) {
                let year: i32 = field(&caps, "year", label)?;
                let month: u32 = field(&caps, "month", label)?;
                let day: u32 = field(&caps, "day", label)?;
                return NaiveDate::from_ymd_opt(year, month, day)
                    .map(DateRange::week_from)
                    .ok_or_else(|| Unresolved::InvalidDate(label.to_string()));
            }
        }

        Err(Unresolved::NoMatch(label.to_string()))
    }
}

/// Monday of ISO `week` in `year`.
///
/// Week 1 holds January 4, so its Monday is Jan 4 minus (weekday - 1) days,
/// with Monday = 1 through Sunday = 7. Returns `None` only past chrono's
/// calendar limits.
pub fn iso_week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let weekday = jan4.weekday().number_from_monday();
    let week1_monday = jan4.checked_sub_signed(Duration::days(i64::from(weekday - 1)))?;
    week1_monday.checked_add_signed(Duration::weeks(i64::from(week.saturating_sub(1))))
}

/// The Monday-to-Sunday week holding `date`.
pub fn week_containing(date: NaiveDate) -> DateRange {
    let offset = date.weekday().num_days_from_monday();
    DateRange::week_from(date - Duration::days(i64::from(offset)))
}

fn week_range(year: i32, week: u32) -> Result<DateRange, Unresolved> {
    if year < MIN_YEAR {
        return Err(Unresolved::YearOutOfRange(year));
    }
    if !(1..=MAX_WEEK).contains(&week) {
        return Err(Unresolved::WeekOutOfRange(week));
    }
    iso_week_start(year, week)
        .map(DateRange::week_from)
        .ok_or_else(|| Unresolved::InvalidDate(format!("{year}-W{week:02}")))
}

fn explicit_range(point: &WeekPoint) -> Option<DateRange> {
    let start = parse_calendar_date(point.start.as_deref()?);
    let end = parse_calendar_date(point.end.as_deref()?);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Some(DateRange::new(start, end)),
        _ => {
            debug!(week = %point.week, "ignoring unusable explicit week bounds");
            None
        }
    }
}

fn field<T: std::str::FromStr>(caps: &Captures<'_>, name: &str, label: &str) -> Result<T, Unresolved> {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Unresolved::NoMatch(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver() -> WeekLabelResolver {
        WeekLabelResolver::new().unwrap()
    }

    #[test]
    fn test_2024_w01() {
        let range = resolver().resolve(Some("2024-W01"), None).unwrap();
        assert_eq!(range, DateRange::new(date(2024, 1, 1), date(2024, 1, 7)));
    }

    #[test]
    fn test_2023_w10() {
        let range = resolver().resolve(Some("2023-W10"), None).unwrap();
        assert_eq!(range, DateRange::new(date(2023, 3, 6), date(2023, 3, 12)));
    }

    #[test]
    fn test_week_label_spellings() {
        let r = resolver();
        let expected = DateRange::new(date(2024, 1, 29), date(2024, 2, 4));
        for label in [
            "2024-W05", "2024 W5", "2024W05", "2024-05", "2024 week 5", "W5 2024", "Week 5 2024",
            "week 5, 2024", "w05-2024", "  2024-w5  ",
        ] {
            assert_eq!(r.resolve_label(label), Ok(expected), "label {label:?}");
        }
    }

    #[test]
    fn test_week_one_can_start_in_previous_year() {
        // 2026-01-04 is a Sunday, so week 1 starts Monday 2025-12-29
        let range = resolver().resolve_label("2026-W01").unwrap();
        assert_eq!(range.start, date(2025, 12, 29));
        assert_eq!(range.end, date(2026, 1, 4));
    }

    #[test]
    fn test_week_53() {
        let range = resolver().resolve_label("2020-W53").unwrap();
        assert_eq!(range.start, date(2020, 12, 28));
        assert_eq!(range.end, date(2021, 1, 3));
    }

    #[test]
    fn test_week_out_of_range() {
        let r = resolver();
        assert_eq!(r.resolve_label("2024-W54"), Err(Unresolved::WeekOutOfRange(54)));
        assert_eq!(r.resolve_label("2024-W00"), Err(Unresolved::WeekOutOfRange(0)));
    }

    #[test]
    fn test_year_floor() {
        assert_eq!(
            resolver().resolve_label("1969-W10"),
            Err(Unresolved::YearOutOfRange(1969))
        );
        assert!(resolver().resolve_label("1970-W01").is_ok());
    }

    #[test]
    fn test_iso_date_label_starts_range() {
        let r = resolver();
        let expected = DateRange::new(date(2024, 3, 4), date(2024, 3, 10));
        assert_eq!(r.resolve_label("2024-03-04"), Ok(expected));
        assert_eq!(r.resolve_label("2024/03/04"), Ok(expected));
    }

    #[test]
    fn test_date_label_is_not_snapped_to_monday() {
        // 2024-03-06 is a Wednesday
        let range = resolver().resolve_label("2024-03-06").unwrap();
        assert_eq!(range.start, date(2024, 3, 6));
        assert_eq!(range.end, date(2024, 3, 12));
    }

    #[test]
    fn test_day_month_year_label() {
        let range = resolver().resolve_label("04/03/2024").unwrap();
        assert_eq!(range, DateRange::new(date(2024, 3, 4), date(2024, 3, 10)));
    }

    #[test]
    fn test_impossible_dates() {
        let r = resolver();
        assert_eq!(
            r.resolve_label("2024-02-30"),
            Err(Unresolved::InvalidDate("2024-02-30".into()))
        );
        assert!(matches!(r.resolve_label("31/13/2024"), Err(Unresolved::InvalidDate(_))));
    }

    #[test]
    fn test_not_a_week() {
        assert_eq!(
            resolver().resolve(Some("not-a-week"), None),
            Err(Unresolved::NoMatch("not-a-week".into()))
        );
    }

    #[test]
    fn test_no_label() {
        let r = resolver();
        assert_eq!(r.resolve(None, None), Err(Unresolved::NoLabel));
        assert_eq!(r.resolve(Some("   "), None), Err(Unresolved::NoLabel));
    }

    #[test]
    fn test_explicit_bounds_win() {
        let r = resolver();
        let point = WeekPoint::labelled("2019-W40").with_bounds("2024-03-04", "2024-03-10");
        let expected = DateRange::new(date(2024, 3, 4), date(2024, 3, 10));
        assert_eq!(r.resolve(Some("not-a-week"), Some(&point)), Ok(expected));
        assert_eq!(r.resolve(Some("2001-W01"), Some(&point)), Ok(expected));
        assert_eq!(r.resolve(None, Some(&point)), Ok(expected));
    }

    #[test]
    fn test_explicit_bounds_truncate_time() {
        let point = WeekPoint::labelled("")
            .with_bounds("2024-03-04T00:00:00", "2024-03-10T23:59:59Z");
        let range = resolver().resolve(None, Some(&point)).unwrap();
        assert_eq!(range, DateRange::new(date(2024, 3, 4), date(2024, 3, 10)));
    }

    #[test]
    fn test_half_bounds_fall_back_to_label() {
        let mut point = WeekPoint::labelled("2024-W01");
        point.start = Some("2024-03-04".into());
        let range = resolver().resolve(None, Some(&point)).unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
    }

    #[test]
    fn test_unusable_bounds_fall_back_to_label() {
        let r = resolver();
        let garbled = WeekPoint::labelled("2024-W01").with_bounds("soon", "2024-03-10");
        assert_eq!(r.resolve(None, Some(&garbled)).unwrap().start, date(2024, 1, 1));

        let reversed = WeekPoint::labelled("2024-W01").with_bounds("2024-03-10", "2024-03-04");
        assert_eq!(r.resolve(None, Some(&reversed)).unwrap().start, date(2024, 1, 1));
    }

    #[test]
    fn test_explicit_label_beats_point_label() {
        let point = WeekPoint::labelled("2024-W01");
        let range = resolver().resolve(Some("2023-W10"), Some(&point)).unwrap();
        assert_eq!(range.start, date(2023, 3, 6));
    }

    #[test]
    fn test_iso_week_start_matches_chrono() {
        for year in [1970, 1999, 2015, 2020, 2024, 2026, 2037] {
            for week in [1, 10, 26, 52] {
                let expected = NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon);
                assert_eq!(iso_week_start(year, week), expected, "{year}-W{week}");
            }
        }
    }

    #[test]
    fn test_week_containing() {
        // Thursday
        let range = week_containing(date(2024, 1, 4));
        assert_eq!(range, DateRange::new(date(2024, 1, 1), date(2024, 1, 7)));
        // Sunday belongs to the week that started the Monday before
        assert_eq!(week_containing(date(2024, 1, 7)).start, date(2024, 1, 1));
        assert_eq!(week_containing(date(2024, 1, 8)).start, date(2024, 1, 8));
    }

    #[test]
    fn test_iso_label_round_trips() {
        let r = resolver();
        for label in ["2024-W01", "2023-W10", "2020-W53", "2026-W01"] {
            let range = r.resolve_label(label).unwrap();
            assert_eq!(range.iso_label(), label);
        }
    }
}
