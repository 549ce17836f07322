//! Research date windows

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Date format used in inputs, prompts and provider queries
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the default window
pub const DEFAULT_LOOKBACK_DAYS: u64 = 365;

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; no ordering is enforced
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `[today - 365 days, today]`
    pub fn trailing_year(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, today)
    }

    /// Turn two optional `YYYY-MM-DD` strings into a range
    ///
    /// A missing (or blank) start defaults to a year before `today`, a
    /// missing end to `today`. If either given string does not parse, both
    /// ends fall back to the default window.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use stock_research::DateRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    /// let range = DateRange::normalize(Some("2024-01-02"), None, today);
    /// assert_eq!(range.to_strings(), ("2024-01-02".to_string(), "2024-06-30".to_string()));
    ///
    /// let range = DateRange::normalize(Some("01/02/2024"), None, today);
    /// assert_eq!(range, DateRange::trailing_year(today));
    /// ```
    pub fn normalize(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let default = Self::trailing_year(today);

        Self::parse_with_defaults(start, end, default).unwrap_or_else(|e| {
            warn!(
                start = start.unwrap_or_default(),
                end = end.unwrap_or_default(),
                error = %e,
                "Invalid date format, using the default window"
            );
            default
        })
    }

    fn parse_with_defaults(
        start: Option<&str>,
        end: Option<&str>,
        default: Self,
    ) -> Result<Self, chrono::ParseError> {
        let start = match non_blank(start) {
            Some(s) => parse_date(s)?,
            None => default.start,
        };
        let end = match non_blank(end) {
            Some(s) => parse_date(s)?,
            None => default.end,
        };
        Ok(Self::new(start, end))
    }

    /// [`normalize`](Self::normalize) against the local calendar date
    pub fn resolve(start: Option<&str>, end: Option<&str>) -> Self {
        Self::normalize(start, end, Local::now().date_naive())
    }

    /// Both ends formatted as `YYYY-MM-DD`
    pub fn to_strings(&self) -> (String, String) {
        (format_date(self.start), format_date(self.end))
    }

    /// The day after `end`, for providers that treat the end as exclusive
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }

    /// Whether `date` falls within the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (start, end) = self.to_strings();
        write!(f, "{start} to {end}")
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_to_trailing_year() {
        let today = date(2024, 6, 30);
        let range = DateRange::normalize(None, None, today);

        assert_eq!(range.start, date(2023, 7, 1));
        assert_eq!(range.end, today);
        assert_eq!(range, DateRange::trailing_year(today));
    }

    #[test]
    fn test_blank_strings_are_missing() {
        let today = date(2024, 6, 30);
        let range = DateRange::normalize(Some("  "), Some(""), today);
        assert_eq!(range, DateRange::trailing_year(today));
    }

    #[test]
    fn test_explicit_dates() {
        let today = date(2024, 6, 30);
        let range = DateRange::normalize(Some("2024-01-01"), Some(" 2024-03-31 "), today);

        assert_eq!(range, DateRange::new(date(2024, 1, 1), date(2024, 3, 31)));
        assert_eq!(
            range.to_strings(),
            ("2024-01-01".to_string(), "2024-03-31".to_string())
        );
        assert_eq!(range.to_string(), "2024-01-01 to 2024-03-31");
    }

    #[test]
    fn test_unparsable_falls_back_entirely() {
        let today = date(2024, 6, 30);
        let default = DateRange::trailing_year(today);

        assert_eq!(
            DateRange::normalize(Some("2024-01-01"), Some("yesterday"), today),
            default
        );
        assert_eq!(DateRange::normalize(Some("2024-13-01"), None, today), default);
        assert_eq!(
            DateRange::normalize(None, Some("2024/03/31"), today),
            default
        );
    }

    #[test]
    fn test_leap_year_window() {
        let range = DateRange::trailing_year(date(2024, 3, 1));
        assert_eq!(range.start, date(2023, 3, 2));
    }

    #[test]
    fn test_end_exclusive_and_contains() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(range.end_exclusive(), date(2024, 2, 1));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
    }

    #[test]
    fn test_resolve_ends_today() {
        let range = DateRange::resolve(None, None);
        assert_eq!(range.end, Local::now().date_naive());
    }
}
