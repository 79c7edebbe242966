use anyhow::{bail, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};

/// Parses a time filter string into a Unix timestamp.
///
/// Accepted formats:
/// - Unix timestamp in seconds (e.g. "1735689600")
/// - Date (e.g. "2025-03-20"), interpreted as local midnight
/// - DateTime (e.g. "2025-03-20 15:30:00"), local time
pub fn parse_time(s: &str) -> Result<u64> {
    if let Ok(timestamp) = s.parse::<u64>() {
        return Ok(timestamp);
    }

    let datetime = if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0).unwrap()
    } else if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        datetime
    } else {
        bail!("invalid time '{s}', expected formats: unix timestamp, YYYY-MM-DD, or YYYY-MM-DD HH:MM:SS");
    };

    let local = match Local.from_local_datetime(&datetime).single() {
        Some(local) => local,
        None => bail!("invalid local time"),
    };
    Ok(local.timestamp() as u64)
}
