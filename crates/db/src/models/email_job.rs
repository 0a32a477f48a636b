//! Certificate email queue rows.

use eventhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `email_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailJobRow {
    pub id: DbId,
    pub queue: String,
    /// The serialized job exactly as the producer wrote it.
    pub payload: String,
    pub idempotency_key: String,
    pub attempts: i32,
    pub enqueued_at: Timestamp,
    pub available_at: Timestamp,
    pub leased_until: Option<Timestamp>,
    pub last_error: Option<String>,
    pub delivered_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
}

/// DTO for appending a job to a queue.
#[derive(Debug, Clone)]
pub struct NewEmailJob {
    pub payload: String,
    pub idempotency_key: String,
}
