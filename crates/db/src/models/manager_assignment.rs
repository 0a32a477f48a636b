//! Manager attendance scope models.

use eventhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `manager_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ManagerAssignment {
    pub id: DbId,
    pub manager_id: DbId,
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    pub event_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An assignment joined with the names an admin needs to read it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ManagerAssignmentDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: ManagerAssignment,
    pub manager_name: String,
    pub event_title: String,
    pub event_seq_id: i32,
}

/// Request body for assigning a manager to an event.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignManagerRequest {
    pub manager_id: DbId,
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    /// Sequence id of the event within its owning list.
    pub event_id: i32,
}
