//! Half-open UTC time windows for event listings
//!
//! Path segments arrive as strings; each constructor parses and range-checks
//! them, reporting the matching `Invalid*` error.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::{ApiError, ApiResult};

/// `[start, end)` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The calendar month `month` of `year`
    pub fn month(year: &str, month: &str) -> ApiResult<Self> {
        let year = parse_year(year)?;
        let month = parse_bounded(month, 1, 12, ApiError::InvalidMonth)?;

        let start = ymd(year, month, 1, ApiError::InvalidMonth)?;
        let end = if month == 12 {
            ymd(year + 1, 1, 1, ApiError::InvalidYear)?
        } else {
            ymd(year, month + 1, 1, ApiError::InvalidMonth)?
        };

        Ok(Self::between(start, end))
    }

    /// A single day
    pub fn day(year: &str, month: &str, day: &str) -> ApiResult<Self> {
        let year = parse_year(year)?;
        let month = parse_bounded(month, 1, 12, ApiError::InvalidMonth)?;
        let day = parse_bounded(day, 1, 31, ApiError::InvalidDay)?;

        // 31 passes the bounds check but not every month has it
        let start = ymd(year, month, day, ApiError::InvalidDay)?;

        Ok(Self::from_start(start, 1))
    }

    /// ISO-8601 week `week` of `year`; week 1 contains January 4
    pub fn week(year: &str, week: &str) -> ApiResult<Self> {
        let year = parse_year(year)?;
        let week = parse_bounded(week, 1, 53, ApiError::InvalidWeekNumber)?;

        let start = week_one_monday(year)? + Duration::weeks(i64::from(week - 1));

        Ok(Self::from_start(start, 7))
    }

    fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: midnight(start),
            end: midnight(end),
        }
    }

    fn from_start(start: NaiveDate, days: i64) -> Self {
        let start = midnight(start);
        Self {
            start,
            end: start + Duration::days(days),
        }
    }
}

/// Monday of ISO week 1
fn week_one_monday(year: i32) -> ApiResult<NaiveDate> {
    let jan4 = ymd(year, 1, 4, ApiError::InvalidYear)?;
    let weekday = i64::from(jan4.weekday().number_from_monday());

    Ok(jan4 - Duration::days(weekday - 1))
}

fn parse_year(value: &str) -> ApiResult<i32> {
    let year = parse_bounded(value, 1, 9999, ApiError::InvalidYear)?;
    i32::try_from(year).map_err(|_| ApiError::InvalidYear)
}

fn parse_bounded(value: &str, min: u32, max: u32, error: ApiError) -> ApiResult<u32> {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= i64::from(min) && n <= i64::from(max) => Ok(n as u32),
        _ => Err(error),
    }
}

fn ymd(year: i32, month: u32, day: u32, error: ApiError) -> ApiResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(error)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_month_range() {
        let range = DateRange::month("2024", "2").unwrap();
        assert_eq!(range.start, utc(2024, 2, 1));
        assert_eq!(range.end, utc(2024, 3, 1));
    }

    #[test]
    fn test_december_rolls_over_to_next_year() {
        let range = DateRange::month("2023", "12").unwrap();
        assert_eq!(range.start, utc(2023, 12, 1));
        assert_eq!(range.end, utc(2024, 1, 1));
    }

    #[test]
    fn test_day_range() {
        let range = DateRange::day("2024", "1", "15").unwrap();
        assert_eq!(range.start, utc(2024, 1, 15));
        assert_eq!(range.end, utc(2024, 1, 16));

        let leap = DateRange::day("2024", "2", "29").unwrap();
        assert_eq!(leap.end, utc(2024, 3, 1));
    }

    #[test]
    fn test_week_one_of_2024_starts_on_new_year() {
        let range = DateRange::week("2024", "1").unwrap();
        assert_eq!(range.start, utc(2024, 1, 1));
        assert_eq!(range.end, utc(2024, 1, 8));
        assert_eq!(range.start.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_week_one_of_2020_starts_in_previous_year() {
        // January 4th 2020 is a Saturday
        let range = DateRange::week("2020", "1").unwrap();
        assert_eq!(range.start, utc(2019, 12, 30));
        assert_eq!(range.end, utc(2020, 1, 6));
    }

    #[test]
    fn test_later_weeks_and_week_53() {
        let range = DateRange::week("2024", "3").unwrap();
        assert_eq!(range.start, utc(2024, 1, 15));

        let range = DateRange::week("2020", "53").unwrap();
        assert_eq!(range.start, utc(2020, 12, 28));
        assert_eq!(range.end, utc(2021, 1, 4));
    }

    #[test]
    fn test_every_week_one_starts_on_monday() {
        for year in 1990..2040 {
            let range = DateRange::week(&year.to_string(), "1").unwrap();
            assert_eq!(range.start.weekday(), Weekday::Mon, "year {year}");
            assert_eq!(range.end - range.start, Duration::days(7));
        }
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(DateRange::month("2024", "0"), Err(ApiError::InvalidMonth));
        assert_eq!(DateRange::month("2024", "13"), Err(ApiError::InvalidMonth));
        assert_eq!(DateRange::month("2024", "jan"), Err(ApiError::InvalidMonth));
    }

    #[test]
    fn test_day_bounds() {
        assert_eq!(DateRange::day("2024", "1", "0"), Err(ApiError::InvalidDay));
        assert_eq!(DateRange::day("2024", "1", "32"), Err(ApiError::InvalidDay));
        assert_eq!(DateRange::day("2023", "2", "29"), Err(ApiError::InvalidDay));
        assert_eq!(DateRange::day("2024", "13", "1"), Err(ApiError::InvalidMonth));
    }

    #[test]
    fn test_week_bounds() {
        assert_eq!(
            DateRange::week("2024", "0"),
            Err(ApiError::InvalidWeekNumber)
        );
        assert_eq!(
            DateRange::week("2024", "54"),
            Err(ApiError::InvalidWeekNumber)
        );
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(DateRange::month("0", "1"), Err(ApiError::InvalidYear));
        assert_eq!(DateRange::month("-4", "1"), Err(ApiError::InvalidYear));
        assert_eq!(DateRange::week("abc", "1"), Err(ApiError::InvalidYear));
        assert_eq!(DateRange::day("10000", "1", "1"), Err(ApiError::InvalidYear));
    }
}
