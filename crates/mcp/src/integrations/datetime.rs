use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOCALE_FORMAT: &str = "%A, %B %-d, %Y at %-I:%M:%S %p %Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Iso,
    Locale,
    Unix,
}

impl DateFormat {
    /// Unrecognised names fall back to ISO-8601.
    pub fn parse(name: &str) -> Self {
        match name {
            "locale" => DateFormat::Locale,
            "unix" => DateFormat::Unix,
            _ => DateFormat::Iso,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DateTimeError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeReport {
    pub datetime: String,
    pub format: String,
    pub timezone: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

pub fn parse_timezone(name: &str) -> Result<Tz, DateTimeError> {
    name.parse::<Tz>()
        .map_err(|_| DateTimeError::UnknownTimezone(name.to_string()))
}

/// Render `now` in `format`. Only `locale` uses `timezone` (UTC when
/// absent); `iso` is always UTC and `unix` is zone-free. The zone name is
/// echoed back as given.
pub fn current_datetime(
    format: &str,
    timezone: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTimeReport, DateTimeError> {
    let timezone = timezone.filter(|tz| !tz.is_empty());

    let datetime = match DateFormat::parse(format) {
        DateFormat::Iso => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        DateFormat::Locale => {
            let zone = match timezone {
                Some(name) => parse_timezone(name)?,
                None => Tz::UTC,
            };
            now.with_timezone(&zone).format(LOCALE_FORMAT).to_string()
        }
        DateFormat::Unix => now.timestamp().to_string(),
    };

    Ok(DateTimeReport {
        datetime,
        format: format.to_string(),
        timezone: timezone.unwrap_or("UTC").to_string(),
        timestamp: now.timestamp_millis(),
    })
}
