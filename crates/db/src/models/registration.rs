//! Roster membership models.

use chrono::{NaiveDate, NaiveTime};
use eventhub_core::schedule::{hhmm, Booking, TimeWindow};
use eventhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `event_registrations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Registration {
    pub event_id: DbId,
    pub user_id: DbId,
    pub registered_at: Timestamp,
}

/// An event a participant is registered for, with its schedule.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegisteredEvent {
    pub event_id: DbId,
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    pub seq_id: i32,
    pub title: String,
    pub venue: String,
    pub event_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub registered_at: Timestamp,
}

impl RegisteredEvent {
    /// The schedule slot this registration occupies.
    pub fn booking(&self) -> Booking {
        Booking {
            title: self.title.clone(),
            window: TimeWindow {
                date: self.event_date,
                start: self.start_time,
                end: self.end_time,
            },
        }
    }
}
