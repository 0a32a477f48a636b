//! Certificate job producer.
//!
//! Jobs are appended inside the caller's open transaction under a
//! savepoint, so committed attendance always carries its jobs while a
//! failed enqueue only rolls back the savepoint.

use eventhub_db::models::email_job::NewEmailJob;
use eventhub_db::repositories::EmailJobRepo;
use sqlx::{Connection, PgConnection};

use crate::job::{EmailJob, CERTIFICATE_QUEUE};

/// A job together with the key that dedupes it on the queue.
#[derive(Debug, Clone)]
pub struct KeyedJob {
    pub idempotency_key: String,
    pub job: EmailJob,
}

#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("Failed to serialize job: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write to queue: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append certificate jobs and wake listening workers on commit.
///
/// Never fails the caller: an error is logged and zero is returned.
/// Returns the number of jobs actually added (duplicates are skipped).
pub async fn enqueue_certificates(conn: &mut PgConnection, jobs: &[KeyedJob]) -> u64 {
    if jobs.is_empty() {
        return 0;
    }
    match try_enqueue(conn, jobs).await {
        Ok(added) => {
            tracing::info!(
                queue = CERTIFICATE_QUEUE,
                requested = jobs.len(),
                added,
                "Certificate emails enqueued"
            );
            added
        }
        Err(e) => {
            tracing::error!(
                queue = CERTIFICATE_QUEUE,
                count = jobs.len(),
                error = %e,
                "Failed to enqueue certificate emails"
            );
            0
        }
    }
}

async fn try_enqueue(conn: &mut PgConnection, jobs: &[KeyedJob]) -> Result<u64, ProducerError> {
    let rows = jobs
        .iter()
        .map(|j| {
            Ok(NewEmailJob {
                payload: j.job.to_wire()?,
                idempotency_key: j.idempotency_key.clone(),
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    let mut savepoint = conn.begin().await?;
    let added = EmailJobRepo::enqueue(&mut savepoint, CERTIFICATE_QUEUE, &rows).await?;
    if added > 0 {
        EmailJobRepo::notify(&mut savepoint, CERTIFICATE_QUEUE).await?;
    }
    savepoint.commit().await?;
    Ok(added)
}
