//! Calendar Decomposition

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Calendar sub-fields of a wall-clock timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Month (1-12)
    pub month: u32,
    /// Weekday (0=Monday .. 6=Sunday)
    pub weekday: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Day of year (1-366)
    pub day_of_year: u32,
    /// Four-digit year, kept as a label because the model one-hot encodes it
    pub year: String,
}

impl CalendarFields {
    /// Decompose a timestamp into its calendar fields
    pub fn from_timestamp(ts: &NaiveDateTime) -> Self {
        Self {
            hour: ts.hour(),
            month: ts.month(),
            weekday: ts.weekday().num_days_from_monday(),
            day: ts.day(),
            day_of_year: ts.ordinal(),
            year: format!("{:04}", ts.year()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_mid_july_monday() {
        let fields = CalendarFields::from_timestamp(&at(2024, 7, 15, 10));
        assert_eq!(fields.hour, 10);
        assert_eq!(fields.month, 7);
        assert_eq!(fields.weekday, 0);
        assert_eq!(fields.day, 15);
        assert_eq!(fields.day_of_year, 197);
        assert_eq!(fields.year, "2024");
    }

    #[test]
    fn test_leap_year_end() {
        let fields = CalendarFields::from_timestamp(&at(2012, 12, 31, 23));
        assert_eq!(fields.day_of_year, 366);
        assert_eq!(fields.weekday, 0);
    }

    #[test]
    fn test_sunday_is_six() {
        let fields = CalendarFields::from_timestamp(&at(2011, 1, 2, 0));
        assert_eq!(fields.weekday, 6);
        assert_eq!(fields.hour, 0);
        assert_eq!(fields.day_of_year, 2);
    }
}
