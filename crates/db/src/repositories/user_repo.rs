//! Repository for the `users` table.

use eventhub_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::user::{CreateUser, User};

/// Column list for users queries.
const COLUMNS: &str = "id, email, full_name, college, college_id, role, is_approved, \
    payment_status, created_at, updated_at";

/// Read access to participant accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user row, returning it.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (email, full_name, college, college_id, role, is_approved, payment_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.full_name)
            .bind(&input.college)
            .bind(&input.college_id)
            .bind(&input.role)
            .bind(input.is_approved)
            .bind(&input.payment_status)
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by ID and lock the row until the transaction ends.
    ///
    /// Serialises concurrent registrations by the same participant so the
    /// schedule-conflict check sees every committed booking.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Load several users at once. Unknown IDs are skipped.
    pub async fn find_many<'e>(
        executor: impl PgExecutor<'e>,
        ids: &[DbId],
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }
}
