use chrono::{Datelike, NaiveDate};

pub const FALLBACK_CLIPPINGS_DATE: &str = "Thursday, 1 January 1970 00:00:00";

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
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

/// Turns `2014-12-19T19:54:11.000` into `Friday, 19 December 2014 19:54:11`.
///
/// Anything that does not parse yields [`FALLBACK_CLIPPINGS_DATE`].
pub fn format_for_clippings(timestamp: &str) -> String {
    parse_clippings_date(timestamp).unwrap_or_else(|| FALLBACK_CLIPPINGS_DATE.to_string())
}

fn parse_clippings_date(timestamp: &str) -> Option<String> {
    let mut halves = timestamp.split('T');
    let (date_part, time_part) = (halves.next()?, halves.next()?);
    if halves.next().is_some() {
        return None;
    }

    let [year, month, day] = split_exact::<3>(date_part, '-')?;
    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;

    if !(1..=9999).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let [hour, minute, second] = split_exact::<3>(time_part, ':')?;
    let hour = truncate_component(hour)?;
    let minute = truncate_component(minute)?;
    let second = truncate_component(second)?;

    let weekday = DAYS[date.weekday().num_days_from_monday() as usize];
    let month_name = MONTHS[date.month0() as usize];

    Some(format!(
        "{}, {} {} {} {:02}:{:02}:{:02}",
        weekday, day, month_name, year, hour, minute, second
    ))
}

fn split_exact<const N: usize>(s: &str, sep: char) -> Option<[&str; N]> {
    let parts: Vec<&str> = s.split(sep).collect();
    parts.try_into().ok()
}

// Seconds may carry a fractional part ("11.000"); it is dropped.
// Values outside i64 (including NaN and infinities) do not parse.
fn truncate_component(s: &str) -> Option<i64> {
    let value = s.trim().parse::<f64>().ok()?.trunc();
    if !(i64::MIN as f64..i64::MAX as f64).contains(&value) {
        return None;
    }
    Some(value as i64)
}
