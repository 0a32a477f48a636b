//! Repository for the `manager_assignments` table.

use eventhub_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::manager_assignment::{ManagerAssignment, ManagerAssignmentDetail};

/// Column list for manager_assignments queries.
const COLUMNS: &str =
    "id, manager_id, category_id, subcategory_id, event_id, created_at, updated_at";

/// Select list joining assignments with manager and event names.
const DETAIL_SELECT: &str = "SELECT a.id, a.manager_id, a.category_id, a.subcategory_id, \
    a.event_id, a.created_at, a.updated_at, u.full_name AS manager_name, \
    e.title AS event_title, e.seq_id AS event_seq_id \
    FROM manager_assignments a \
    JOIN users u ON u.id = a.manager_id \
    JOIN events e ON e.id = a.event_id";

/// Provides operations on manager attendance scopes.
pub struct ManagerAssignmentRepo;

impl ManagerAssignmentRepo {
    /// Create the assignment, or touch it if it already exists.
    pub async fn upsert(
        pool: &PgPool,
        manager_id: DbId,
        category_id: DbId,
        subcategory_id: Option<DbId>,
        event_id: DbId,
    ) -> Result<ManagerAssignment, sqlx::Error> {
        let query = format!(
            "INSERT INTO manager_assignments (manager_id, category_id, subcategory_id, event_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_manager_assignments_scope
             DO UPDATE SET updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ManagerAssignment>(&query)
            .bind(manager_id)
            .bind(category_id)
            .bind(subcategory_id)
            .bind(event_id)
            .fetch_one(pool)
            .await
    }

    /// Whether the manager is assigned to exactly this scope.
    pub async fn exists<'e>(
        executor: impl PgExecutor<'e>,
        manager_id: DbId,
        category_id: DbId,
        subcategory_id: Option<DbId>,
        event_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM manager_assignments
                WHERE manager_id = $1
                  AND category_id = $2
                  AND subcategory_id IS NOT DISTINCT FROM $3
                  AND event_id = $4
             )",
        )
        .bind(manager_id)
        .bind(category_id)
        .bind(subcategory_id)
        .bind(event_id)
        .fetch_one(executor)
        .await
    }

    /// All assignments with names, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ManagerAssignmentDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY a.updated_at DESC, a.id DESC");
        sqlx::query_as::<_, ManagerAssignmentDetail>(&query)
            .fetch_all(pool)
            .await
    }

    /// Assignments held by one manager.
    pub async fn list_for_manager(
        pool: &PgPool,
        manager_id: DbId,
    ) -> Result<Vec<ManagerAssignmentDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE a.manager_id = $1 ORDER BY a.id");
        sqlx::query_as::<_, ManagerAssignmentDetail>(&query)
            .bind(manager_id)
            .fetch_all(pool)
            .await
    }

    /// Remove an assignment. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM manager_assignments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
