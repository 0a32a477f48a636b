//! Attendance sessions, statuses, authorization and entry filtering.
//!
//! An attendance sheet is keyed by (category, subcategory?, event, date,
//! session). The first submission locks the sheet; afterwards only an
//! admin may replace its entries.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_MANAGER};
use crate::schedule::parse_date;
use crate::types::DbId;

pub const SESSION_MORNING: &str = "morning";
pub const SESSION_AFTERNOON: &str = "afternoon";
pub const SESSION_EVENING: &str = "evening";
pub const SESSION_FULL: &str = "full";

/// All valid session values.
pub const VALID_SESSIONS: &[&str] = &[SESSION_MORNING, SESSION_AFTERNOON, SESSION_EVENING, SESSION_FULL];

/// Session used when a read does not name one.
pub const DEFAULT_SESSION: &str = SESSION_FULL;

pub const STATUS_PRESENT: &str = "present";
pub const STATUS_ABSENT: &str = "absent";

/// All valid attendance status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PRESENT, STATUS_ABSENT];

/// Validate that a session string is one of the accepted values.
pub fn validate_session(session: &str) -> Result<(), CoreError> {
    if VALID_SESSIONS.contains(&session) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid session '{session}'. Must be one of: {}",
            VALID_SESSIONS.join(", ")
        )))
    }
}

/// Validate that an attendance status is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid attendance status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

/// Parse the mandatory date of a submission.
///
/// A missing or blank date is [`CoreError::MissingDate`]; it is never
/// defaulted. A present but malformed date is a validation failure.
pub fn require_date(date: Option<&str>) -> Result<NaiveDate, CoreError> {
    match date.map(str::trim) {
        None | Some("") => Err(CoreError::MissingDate),
        Some(raw) => parse_date(raw).map_err(CoreError::Validation),
    }
}

/// Whether a caller may read or write attendance for an event.
///
/// Admins always may. Managers may only when an assignment matches the
/// exact (category, subcategory, event) reference. Every other role is
/// refused.
pub fn is_authorized(role: &str, has_matching_assignment: bool) -> bool {
    match role {
        ROLE_ADMIN => true,
        ROLE_MANAGER => has_matching_assignment,
        _ => false,
    }
}

/// [`is_authorized`] as a `Result`.
pub fn authorize(role: &str, has_matching_assignment: bool) -> Result<(), CoreError> {
    if is_authorized(role, has_matching_assignment) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You are not assigned to manage attendance for this event".into(),
        ))
    }
}

/// One participant's mark as submitted by a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub user_id: DbId,
    pub status: String,
}

/// Keep only marks for participants on the roster.
///
/// Marks for anyone not registered are dropped silently. If a participant
/// is marked more than once, the last mark wins; output order follows the
/// first appearance of each participant.
pub fn filter_to_roster(marks: Vec<Mark>, roster: &HashSet<DbId>) -> Vec<Mark> {
    let mut kept: Vec<Mark> = Vec::with_capacity(marks.len());
    let mut position: HashMap<DbId, usize> = HashMap::with_capacity(marks.len());
    for mark in marks {
        if !roster.contains(&mark.user_id) {
            continue;
        }
        match position.entry(mark.user_id) {
            Entry::Occupied(slot) => kept[*slot.get()].status = mark.status,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(mark);
            }
        }
    }
    kept
}

/// Present/absent tallies for one attendance sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceCounts {
    pub present: i64,
    pub absent: i64,
    pub total: i64,
}

impl AttendanceCounts {
    /// Tally a sequence of status strings.
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                STATUS_PRESENT => counts.present += 1,
                STATUS_ABSENT => counts.absent += 1,
                _ => {}
            }
            counts.total += 1;
        }
        counts
    }
}
