//! Attendance sheet models.

use chrono::NaiveDate;
use eventhub_core::attendance::AttendanceCounts;
use eventhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The unique key of an attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceKey {
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    /// Database id of the event (not its sequence id).
    pub event_id: DbId,
    pub date: NaiveDate,
    pub session: String,
}

/// A row from the `attendance_documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceDocument {
    pub id: DbId,
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    pub event_id: DbId,
    pub attendance_date: NaiveDate,
    pub session: String,
    pub submitted_by: DbId,
    pub revision: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `attendance_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceEntry {
    pub id: DbId,
    pub document_id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub marked_by: DbId,
    pub marked_at: Timestamp,
}

/// An attendance sheet as returned to callers. An unsubmitted key yields
/// an empty sheet with `submitted == false`.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    #[serde(flatten)]
    pub key: AttendanceKey,
    pub event_title: String,
    pub submitted: bool,
    pub document_id: Option<DbId>,
    pub revision: Option<i32>,
    pub submitted_by: Option<DbId>,
    pub counts: AttendanceCounts,
    pub entries: Vec<AttendanceEntry>,
}

/// One of the caller's own attendance records.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MyAttendanceRecord {
    pub document_id: DbId,
    pub event_id: DbId,
    pub event_title: String,
    pub attendance_date: NaiveDate,
    pub session: String,
    pub status: String,
    pub marked_at: Timestamp,
}

/// An attendance sheet with tallies, for the admin overview.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub document: AttendanceDocument,
    pub event_title: String,
    pub present: i64,
    pub absent: i64,
    pub total: i64,
}

/// Query string for reading one sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceQuery {
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    /// Sequence id of the event within its owning list.
    pub event_id: i32,
    pub date: Option<String>,
    pub session: Option<String>,
}

/// One participant's mark in a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceMarkInput {
    pub user_id: DbId,
    pub status: String,
}

/// Request body for submitting a sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    /// Sequence id of the event within its owning list.
    pub event_id: i32,
    pub date: Option<String>,
    pub session: String,
    pub entries: Vec<AttendanceMarkInput>,
}
