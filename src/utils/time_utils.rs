use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// How timestamp-bearing payload fields (`updated`, `date`) are encoded.
///
/// The call site declares the encoding up front; a value whose JSON type
/// contradicts the declared format is a parse failure, never a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    EpochSeconds,
    EpochMilliseconds,
    Iso8601,
}

/// Parse a calendar-date payload field (`declaredDate`, `exDate`, ...).
/// Accepts `YYYY-MM-DD` or a full ISO-8601 datetime, taking the date part.
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    parse_iso_datetime(text).map(|dt| dt.date())
}

/// Parse a timestamp payload field according to the declared format.
pub fn parse_timestamp_value(value: &Value, format: TimestampFormat) -> Option<NaiveDateTime> {
    match format {
        TimestampFormat::EpochSeconds => {
            let secs = value.as_f64()?;
            epoch_to_datetime(secs)
        }
        TimestampFormat::EpochMilliseconds => {
            let millis = value.as_f64()?;
            epoch_to_datetime(millis / 1e3)
        }
        TimestampFormat::Iso8601 => parse_iso_datetime(value.as_str()?),
    }
}

fn epoch_to_datetime(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = (secs.fract() * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos).map(|dt| dt.naive_utc())
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
