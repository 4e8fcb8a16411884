//! Business-day date ranges.
//!
//! A business day is any weekday; exchange holidays are not modeled, so a
//! range will contain rows for holidays that no ticker has data for.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("dates must be strictly ascending: {previous} is followed by {next}")]
    NotAscending { previous: NaiveDate, next: NaiveDate },

    #[error("invalid date '{input}' (expected YYYY-MM-DD)")]
    InvalidDate { input: String },
}

/// Ordered, duplicate-free sequence of dates used as a table index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RangeParts")]
pub struct DateRange {
    dates: Vec<NaiveDate>,
}

#[derive(Deserialize)]
struct RangeParts {
    dates: Vec<NaiveDate>,
}

impl TryFrom<RangeParts> for DateRange {
    type Error = CalendarError;

    fn try_from(parts: RangeParts) -> Result<Self, Self::Error> {
        Self::from_dates(parts.dates)
    }
}

impl DateRange {
    /// Every weekday from `start` to `end`, both inclusive.
    ///
    /// `start > end` produces an empty range.
    pub fn business_days(start: NaiveDate, end: NaiveDate) -> Self {
        let mut dates = Vec::new();
        let mut current = start;
        while current <= end {
            if is_business_day(current) {
                dates.push(current);
            }
            current += Duration::days(1);
        }
        Self { dates }
    }

    /// Parse `YYYY-MM-DD` bounds and build the business-day range.
    pub fn parse_business_days(start: &str, end: &str) -> Result<Self, CalendarError> {
        Ok(Self::business_days(parse_date(start)?, parse_date(end)?))
    }

    /// Use an explicit date list as the index. Dates must be strictly ascending.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Result<Self, CalendarError> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CalendarError::NotAscending {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { dates })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    pub fn into_dates(self) -> Vec<NaiveDate> {
        self.dates
    }
}

/// True for Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| CalendarError::InvalidDate {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn business_days_skip_weekends() {
        // 2016-01-01 is a Friday.
        let range = DateRange::business_days(d("2016-01-01"), d("2016-01-11"));
        assert_eq!(
            range.dates(),
            &[
                d("2016-01-01"),
                d("2016-01-04"),
                d("2016-01-05"),
                d("2016-01-06"),
                d("2016-01-07"),
                d("2016-01-08"),
                d("2016-01-11"),
            ]
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::business_days(d("2016-01-04"), d("2016-01-04"));
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn weekend_only_span_is_empty() {
        let range = DateRange::business_days(d("2016-01-02"), d("2016-01-03"));
        assert!(range.is_empty());
    }

    #[test]
    fn reversed_bounds_are_empty() {
        let range = DateRange::business_days(d("2016-12-31"), d("2016-01-01"));
        assert!(range.is_empty());
    }

    #[test]
    fn full_year_2016_has_261_business_days() {
        let range = DateRange::parse_business_days("2016-01-01", "2016-12-31").unwrap();
        assert_eq!(range.len(), 261);
        assert_eq!(range.first(), Some(d("2016-01-01")));
        assert_eq!(range.last(), Some(d("2016-12-30")));
    }

    #[test]
    fn from_dates_requires_strictly_ascending() {
        assert!(DateRange::from_dates(vec![d("2016-01-04"), d("2016-01-05")]).is_ok());
        let err = DateRange::from_dates(vec![d("2016-01-05"), d("2016-01-05")]).unwrap_err();
        assert_eq!(
            err,
            CalendarError::NotAscending {
                previous: d("2016-01-05"),
                next: d("2016-01-05")
            }
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("2016/01/04"),
            Err(CalendarError::InvalidDate { .. })
        ));
    }

    #[test]
    fn deserialized_range_must_be_ascending() {
        let json = r#"{"dates":["2016-01-06","2016-01-04"]}"#;
        let err = serde_json::from_str::<DateRange>(json).unwrap_err();
        assert!(err
            .to_string()
            .contains("2016-01-06 is followed by 2016-01-04"));

        let json = r#"{"dates":["2016-01-04","2016-01-06"]}"#;
        let range: DateRange = serde_json::from_str(json).unwrap();
        assert_eq!(range.dates(), &[d("2016-01-04"), d("2016-01-06")]);
    }
}
