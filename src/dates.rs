use crate::errors::{AppError, AppResult};
use crate::models::ServiceLogFormValues;
use chrono::{Duration, Local, NaiveDate};

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDates {
    pub start_date: String,
    pub end_date: String,
}

pub fn to_date_input_value(date: NaiveDate) -> String {
    date.format(DATE_INPUT_FORMAT).to_string()
}

/// Parses `YYYY-MM-DD` as a calendar date with no timezone attached.
pub fn parse_date_input(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_INPUT_FORMAT)
        .map_err(|error| AppError::InvalidInput(format!("invalid date '{}': {}", raw, error)))
}

pub fn today() -> String {
    to_date_input_value(Local::now().date_naive())
}

pub fn add_days(date: &str, days: i64) -> AppResult<String> {
    let parsed = parse_date_input(date)?;
    let shifted = Duration::try_days(days)
        .and_then(|delta| parsed.checked_add_signed(delta))
        .ok_or_else(|| AppError::InvalidInput(format!("date '{}' + {} days is out of range", date, days)))?;
    Ok(to_date_input_value(shifted))
}

pub fn default_dates() -> DefaultDates {
    let start_date = today();
    // today + 1 always fits in chrono's range
    let end_date = add_days(&start_date, 1).unwrap_or_else(|_| start_date.clone());
    DefaultDates { start_date, end_date }
}

/// Keeps `end_date` pinned to the day after `start_date`. Returns whether the end date changed.
/// An empty or unparsable start date leaves the values untouched.
pub fn sync_end_date(values: &mut ServiceLogFormValues) -> bool {
    if values.start_date.is_empty() {
        return false;
    }
    let Ok(next_day) = add_days(&values.start_date, 1) else {
        return false;
    };
    if values.end_date == next_day {
        return false;
    }
    values.end_date = next_day;
    true
}
