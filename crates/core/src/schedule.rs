//! Event time windows and schedule-conflict detection.
//!
//! Events are same-day windows: a calendar date plus `HH:MM` start and end
//! times. Two windows conflict when they fall on the same date and overlap
//! under the half-open rule `a.start < b.end && a.end > b.start`, so events
//! that merely touch (one ends at 11:00, the next starts at 11:00) do not
//! conflict.

use chrono::{NaiveDate, NaiveTime};

use crate::error::CoreError;

/// Wire format for event start/end times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Wire format for event and attendance dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an `HH:MM` time string.
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| format!("Invalid time '{value}'. Expected HH:MM"))
}

/// Parse a `YYYY-MM-DD` calendar date string.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{value}'. Expected YYYY-MM-DD"))
}

/// A same-day time window on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Build a window, rejecting windows that do not end after they start.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err(format!(
                "End time {} must be after start time {}",
                end.format(TIME_FORMAT),
                start.format(TIME_FORMAT)
            ));
        }
        Ok(Self { date, start, end })
    }

    /// Whether two windows collide (same date, half-open interval overlap).
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.date == other.date && self.start < other.end && self.end > other.start
    }
}

/// An event a participant already holds a place in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub title: String,
    pub window: TimeWindow,
}

impl Booking {
    /// Describe this booking as a [`CoreError::ScheduleConflict`].
    pub fn conflict_error(&self) -> CoreError {
        CoreError::ScheduleConflict {
            title: self.title.clone(),
            date: self.window.date.format(DATE_FORMAT).to_string(),
            start_time: self.window.start.format(TIME_FORMAT).to_string(),
            end_time: self.window.end.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Return the first existing booking that collides with `candidate`.
pub fn find_conflict<'a>(candidate: &TimeWindow, existing: &'a [Booking]) -> Option<&'a Booking> {
    existing.iter().find(|b| candidate.overlaps(&b.window))
}

/// Serde adapter that (de)serializes a [`NaiveTime`] as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(super::TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional fields in patch DTOs.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| crate::schedule::parse_time(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(date: &str, start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(
            parse_date(date).unwrap(),
            parse_time(start).unwrap(),
            parse_time(end).unwrap(),
        )
        .unwrap()
    }

    fn booking(title: &str, w: TimeWindow) -> Booking {
        Booking {
            title: title.to_string(),
            window: w,
        }
    }

    #[test]
    fn overlapping_windows_on_same_date_conflict() {
        let a = window("2025-01-01", "10:00", "11:00");
        let b = window("2025-01-01", "10:30", "11:30");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let a = window("2025-01-01", "10:00", "11:00");
        let c = window("2025-01-01", "11:00", "12:00");
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn different_dates_never_conflict() {
        let a = window("2025-01-01", "10:00", "11:00");
        let b = window("2025-01-02", "10:00", "11:00");
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn containment_is_a_conflict() {
        let outer = window("2025-01-01", "09:00", "17:00");
        let inner = window("2025-01-01", "12:00", "12:30");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn find_conflict_returns_first_collision() {
        let existing = vec![
            booking("Quiz", window("2025-01-01", "08:00", "09:00")),
            booking("Hackathon", window("2025-01-01", "10:00", "11:00")),
            booking("Debate", window("2025-01-01", "10:15", "10:45")),
        ];
        let candidate = window("2025-01-01", "10:30", "11:30");
        let hit = find_conflict(&candidate, &existing).expect("conflict expected");
        assert_eq!(hit.title, "Hackathon");
    }

    #[test]
    fn find_conflict_with_no_bookings_is_none() {
        let candidate = window("2025-01-01", "10:30", "11:30");
        assert!(find_conflict(&candidate, &[]).is_none());
    }

    #[test]
    fn window_must_end_after_start() {
        let date = parse_date("2025-01-01").unwrap();
        let t = parse_time("10:00").unwrap();
        assert!(TimeWindow::new(date, t, t).is_err());
        assert!(TimeWindow::new(date, parse_time("11:00").unwrap(), t).is_err());
    }

    #[test]
    fn parse_time_rejects_garbage() {
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("10am").is_err());
        assert_eq!(parse_time(" 09:05 ").unwrap().format(TIME_FORMAT).to_string(), "09:05");
    }

    #[test]
    fn parse_date_rejects_non_calendar_dates() {
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("01/02/2025").is_err());
        assert!(parse_date("2025-02-28").is_ok());
    }

    #[test]
    fn conflict_error_reports_window() {
        let b = booking("Hackathon", window("2025-01-01", "10:00", "11:00"));
        match b.conflict_error() {
            CoreError::ScheduleConflict {
                title,
                date,
                start_time,
                end_time,
            } => {
                assert_eq!(title, "Hackathon");
                assert_eq!(date, "2025-01-01");
                assert_eq!(start_time, "10:00");
                assert_eq!(end_time, "11:00");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn hhmm_round_trips_through_json() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Slot {
            #[serde(with = "hhmm")]
            at: NaiveTime,
        }
        let slot: Slot = serde_json::from_str(r#"{"at":"14:30"}"#).unwrap();
        assert_eq!(serde_json::to_string(&slot).unwrap(), r#"{"at":"14:30"}"#);
    }
}
