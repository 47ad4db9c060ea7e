//! Raw Observation Supplied by the Input Form

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Accepted timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// One hour of conditions for which demand is estimated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Local wall-clock time, no timezone
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    /// Season code (1=spring, 2=summer, 3=fall, 4=winter)
    pub season: u8,
    /// National holiday flag (0/1)
    pub holiday: u8,
    /// Working day flag (0/1)
    pub workingday: u8,
    /// Weather code (1=clear .. 4=extreme)
    pub weather: u8,
    /// Temperature in °C
    pub temp: f64,
    /// Relative humidity in percent
    pub humidity: i32,
    /// Wind speed in km/h
    pub windspeed: f64,
}

/// Parse a timestamp in one of the accepted `YYYY-MM-DDTHH:MM[:SS]` layouts
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidFormat(format!("unrecognised timestamp '{}'", raw)))
}

/// Season the input form preselects for a calendar month
pub fn default_season(month: u32) -> u8 {
    match month {
        3..=5 => 1,
        6..=8 => 2,
        9..=11 => 3,
        _ => 4,
    }
}

/// Working-day flag the input form preselects: Monday to Friday
pub fn default_working_day(timestamp: &NaiveDateTime) -> u8 {
    match timestamp.weekday() {
        Weekday::Sat | Weekday::Sun => 0,
        _ => 1,
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_without_seconds() {
        let ts = parse_timestamp("2024-07-15T10:00").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.day(), 15);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("15/07/2024"),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_default_season_by_month() {
        assert_eq!(default_season(4), 1);
        assert_eq!(default_season(7), 2);
        assert_eq!(default_season(10), 3);
        assert_eq!(default_season(12), 4);
        assert_eq!(default_season(1), 4);
    }

    #[test]
    fn test_default_working_day() {
        // 2024-07-15 is a Monday, 2024-07-20 a Saturday
        assert_eq!(default_working_day(&parse_timestamp("2024-07-15T10:00").unwrap()), 1);
        assert_eq!(default_working_day(&parse_timestamp("2024-07-20T10:00").unwrap()), 0);
    }

    #[test]
    fn test_observation_json() {
        let json = r#"{
            "timestamp": "2024-07-15T10:00",
            "season": 2, "holiday": 0, "workingday": 1, "weather": 1,
            "temp": 25.0, "humidity": 60, "windspeed": 10.0
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.season, 2);
        assert_eq!(obs.timestamp.minute(), 0);

        let out = serde_json::to_value(&obs).unwrap();
        assert_eq!(out["timestamp"], "2024-07-15T10:00:00");
    }
}
