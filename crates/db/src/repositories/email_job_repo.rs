//! Repository for the `email_jobs` queue table.
//!
//! Jobs are consumed with a lease: [`EmailJobRepo::lease_next`] hides a job
//! from other consumers until its lease expires, and the consumer must
//! [`ack`](EmailJobRepo::ack), [`release`](EmailJobRepo::release) or
//! [`fail`](EmailJobRepo::fail) it. A consumer that dies mid-job simply
//! lets the lease lapse and the job is handed out again.

use std::time::Duration;

use eventhub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::email_job::{EmailJobRow, NewEmailJob};

/// Column list for email_jobs queries.
const COLUMNS: &str = "id, queue, payload, idempotency_key, attempts, enqueued_at, available_at, \
    leased_until, last_error, delivered_at, failed_at";

/// Provides durable queue operations for certificate emails.
pub struct EmailJobRepo;

impl EmailJobRepo {
    /// Append jobs to the tail of `queue`.
    ///
    /// Jobs whose idempotency key is already present are skipped. Returns the
    /// number of jobs actually added.
    pub async fn enqueue(
        conn: &mut PgConnection,
        queue: &str,
        jobs: &[NewEmailJob],
    ) -> Result<u64, sqlx::Error> {
        if jobs.is_empty() {
            return Ok(0);
        }
        let payloads: Vec<&str> = jobs.iter().map(|j| j.payload.as_str()).collect();
        let keys: Vec<&str> = jobs.iter().map(|j| j.idempotency_key.as_str()).collect();

        let result = sqlx::query(
            "INSERT INTO email_jobs (queue, payload, idempotency_key)
             SELECT $1, j.payload, j.idempotency_key
             FROM UNNEST($2::TEXT[], $3::TEXT[]) WITH ORDINALITY AS j(payload, idempotency_key, ord)
             ORDER BY j.ord
             ON CONFLICT ON CONSTRAINT uq_email_jobs_idempotency_key DO NOTHING",
        )
        .bind(queue)
        .bind(&payloads)
        .bind(&keys)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Wake consumers listening on `channel`. Delivered when the
    /// surrounding transaction commits.
    pub async fn notify(conn: &mut PgConnection, channel: &str) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_notify($1, '')")
            .bind(channel)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Lease the oldest available job in `queue` for `lease`.
    ///
    /// A job is available when it is neither delivered nor failed, its
    /// retry delay has passed, and it is not under an unexpired lease.
    /// `SKIP LOCKED` lets several consumers lease concurrently without
    /// handing out the same job twice.
    pub async fn lease_next(
        pool: &PgPool,
        queue: &str,
        lease: Duration,
    ) -> Result<Option<EmailJobRow>, sqlx::Error> {
        let query = format!(
            "UPDATE email_jobs
             SET leased_until = NOW() + make_interval(secs => $2),
                 attempts = attempts + 1
             WHERE id = (
                 SELECT id FROM email_jobs
                 WHERE queue = $1
                   AND delivered_at IS NULL
                   AND failed_at IS NULL
                   AND available_at <= NOW()
                   AND (leased_until IS NULL OR leased_until < NOW())
                 ORDER BY id
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailJobRow>(&query)
            .bind(queue)
            .bind(lease.as_secs_f64())
            .fetch_optional(pool)
            .await
    }

    /// Mark a leased job as delivered.
    ///
    /// Every settle call names the `attempt` it leased and only touches a
    /// job that is still open under that attempt. Returns `false` when the
    /// lease was lost to another consumer or the job was already settled.
    pub async fn ack(pool: &PgPool, id: DbId, attempt: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_jobs
             SET delivered_at = NOW(), leased_until = NULL, last_error = NULL
             WHERE id = $1 AND attempts = $2
               AND delivered_at IS NULL AND failed_at IS NULL",
        )
        .bind(id)
        .bind(attempt)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return a leased job to the queue, available again after `retry_after`.
    pub async fn release(
        pool: &PgPool,
        id: DbId,
        attempt: i32,
        error: &str,
        retry_after: Duration,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_jobs
             SET leased_until = NULL,
                 last_error = $3,
                 available_at = NOW() + make_interval(secs => $4)
             WHERE id = $1 AND attempts = $2
               AND delivered_at IS NULL AND failed_at IS NULL",
        )
        .bind(id)
        .bind(attempt)
        .bind(error)
        .bind(retry_after.as_secs_f64())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take a job out of circulation for good.
    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        attempt: i32,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_jobs
             SET failed_at = NOW(), leased_until = NULL, last_error = $3
             WHERE id = $1 AND attempts = $2
               AND delivered_at IS NULL AND failed_at IS NULL",
        )
        .bind(id)
        .bind(attempt)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a job by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EmailJobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_jobs WHERE id = $1");
        sqlx::query_as::<_, EmailJobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All jobs of a queue in FIFO order, regardless of state.
    pub async fn list_queue(pool: &PgPool, queue: &str) -> Result<Vec<EmailJobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_jobs WHERE queue = $1 ORDER BY id");
        sqlx::query_as::<_, EmailJobRow>(&query)
            .bind(queue)
            .fetch_all(pool)
            .await
    }
}
