use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, Months, NaiveDate};

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Moves `date` by a signed number of calendar months, saturating at the
/// representable date bounds. Day-of-month is clamped the way chrono does
/// (e.g. Mar 31 minus one month is Feb 28/29).
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_months(magnitude).unwrap_or(NaiveDate::MIN)
    }
}

pub fn first_day_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (start_date, end_date) covering whole months.
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let start_date = parse_month(parts[0], "date")?;
            Ok((start_date, last_day_of_month(start_date)))
        }
        2 => {
            let start_date = parse_month(parts[0], "start date")?;
            let end_month = parse_month(parts[1], "end date")?;
            Ok((start_date, last_day_of_month(end_month)))
        }
        _ => Err(AnalyticsError::DateError(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}

fn parse_month(part: &str, what: &str) -> Result<NaiveDate> {
    let month_start = format!("{}-01", part.trim());
    NaiveDate::parse_from_str(&month_start, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::DateError(format!(
            "Invalid {} format in period: {}. Expected YYYY-MM",
            what, part
        ))
    })
}

/// Truncates a label to its first `max_chars` characters (not bytes).
pub fn abbreviate_label(label: &str, max_chars: usize) -> String {
    label.chars().take(max_chars).collect()
}
