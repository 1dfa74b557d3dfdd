//! Wall-clock ⟷ UTC conversion for `datetime-local` style inputs.
//!
//! The browser's lighting control hands us a local wall-clock string with
//! minute precision (`2024-06-15T14:30`). The scene wants an absolute
//! instant. Conversions are generic over the time zone so callers (and
//! tests) can pin an offset instead of depending on the host zone.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

/// Minute precision, the format a `datetime-local` input emits.
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const LOCAL_INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    Empty,
    Invalid(String),
    /// The wall-clock time does not exist in the zone, even after skipping a gap.
    Unrepresentable(String),
}

impl std::fmt::Display for TimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeError::Empty => write!(f, "empty datetime input"),
            TimeError::Invalid(msg) => write!(f, "invalid datetime input: {msg}"),
            TimeError::Unrepresentable(msg) => {
                write!(f, "local time does not exist in zone: {msg}")
            }
        }
    }
}

impl std::error::Error for TimeError {}

/// Parse a `datetime-local` value. Seconds (and fractions) are accepted but optional.
pub fn parse_local_input(input: &str) -> Result<NaiveDateTime, TimeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeError::Empty);
    }
    NaiveDateTime::parse_from_str(trimmed, LOCAL_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, LOCAL_INPUT_FORMAT_SECONDS))
        .map_err(|e| TimeError::Invalid(format!("{trimmed}: {e}")))
}

/// Interpret `input` as wall-clock time in `tz` and return the instant.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant.
/// Times inside a spring-forward gap move forward by one hour.
pub fn local_input_to_utc<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>, TimeError> {
    let naive = parse_local_input(input)?;
    resolve_local(tz, naive).map(|dt| dt.with_timezone(&Utc))
}

/// Format `instant` as wall-clock time in `tz`, truncated to minutes.
pub fn utc_to_local_input<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant
        .with_timezone(tz)
        .naive_local()
        .format(LOCAL_INPUT_FORMAT)
        .to_string()
}

pub fn local_input_to_utc_local(input: &str) -> Result<DateTime<Utc>, TimeError> {
    local_input_to_utc(input, &Local)
}

pub fn utc_to_local_input_local(instant: &DateTime<Utc>) -> String {
    utc_to_local_input(instant, &Local)
}

/// "Now" in host wall-clock time, ready to seed a `datetime-local` input.
pub fn current_local_input() -> String {
    utc_to_local_input_local(&Utc::now())
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, TimeError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
            LocalResult::None => Err(TimeError::Unrepresentable(
                naive.format(LOCAL_INPUT_FORMAT).to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::America::New_York;

    fn offset_hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    #[test]
    fn input_is_read_as_wall_clock_time() {
        let utc = local_input_to_utc("2024-06-15T14:30", &offset_hours(-7)).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-06-15T21:30:00+00:00");
    }

    #[test]
    fn round_trip_is_identity_for_fixed_offsets() {
        let zones = [
            offset_hours(-7),
            offset_hours(0),
            FixedOffset::east_opt(5 * 3600 + 1800).unwrap(),
            offset_hours(13),
        ];
        for tz in zones {
            let utc = local_input_to_utc("2024-06-15T14:30", &tz).unwrap();
            assert_eq!(utc_to_local_input(&utc, &tz), "2024-06-15T14:30");
        }
    }

    #[test]
    fn round_trip_crosses_day_boundary() {
        let tz = offset_hours(10);
        let utc = local_input_to_utc("2024-01-01T03:05", &tz).unwrap();
        assert_eq!(utc.to_rfc3339(), "2023-12-31T17:05:00+00:00");
        assert_eq!(utc_to_local_input(&utc, &tz), "2024-01-01T03:05");
    }

    #[test]
    fn seconds_are_accepted_and_dropped_on_output() {
        let tz = offset_hours(2);
        let utc = local_input_to_utc("2024-06-15T14:30:45", &tz).unwrap();
        assert_eq!(utc_to_local_input(&utc, &tz), "2024-06-15T14:30");
    }

    #[test]
    fn rejects_garbage() {
        let tz = offset_hours(0);
        assert_eq!(local_input_to_utc("  ", &tz), Err(TimeError::Empty));
        assert!(matches!(
            local_input_to_utc("2024-13-40T99:00", &tz),
            Err(TimeError::Invalid(_))
        ));
        assert!(matches!(
            local_input_to_utc("yesterday", &tz),
            Err(TimeError::Invalid(_))
        ));
    }

    #[test]
    fn spring_forward_gap_moves_ahead_one_hour() {
        let utc = local_input_to_utc("2024-03-10T02:30", &New_York).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-03-10T07:30:00+00:00");
        assert_eq!(utc_to_local_input(&utc, &New_York), "2024-03-10T03:30");
    }

    #[test]
    fn fall_back_overlap_takes_earlier_instant() {
        let utc = local_input_to_utc("2024-11-03T01:30", &New_York).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-11-03T05:30:00+00:00");
        assert_eq!(utc_to_local_input(&utc, &New_York), "2024-11-03T01:30");
    }

    #[test]
    fn current_local_input_parses_back() {
        let now = current_local_input();
        assert_eq!(now.len(), 16);
        assert!(parse_local_input(&now).is_ok());
    }
}
