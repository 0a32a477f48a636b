//! Participant account model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use eventhub_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    pub college: String,
    pub college_id: String,
    pub role: String,
    pub is_approved: bool,
    pub payment_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for provisioning a user row (identity service sync, fixtures).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    pub college: String,
    pub college_id: String,
    pub role: String,
    pub is_approved: bool,
    pub payment_status: String,
}
