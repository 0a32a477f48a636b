//! Repository for the `subcategories` table.

use eventhub_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::catalog::{CreateSubcategory, Subcategory, UpdateSubcategory};

/// Column list for subcategories queries.
const COLUMNS: &str = "id, category_id, name, created_at, updated_at";

/// Provides CRUD operations for subcategories.
pub struct SubcategoryRepo;

impl SubcategoryRepo {
    /// Insert a new subcategory under a category, returning the created row.
    pub async fn create(
        pool: &PgPool,
        category_id: DbId,
        input: &CreateSubcategory,
    ) -> Result<Subcategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO subcategories (category_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(category_id)
            .bind(input.name.trim())
            .fetch_one(pool)
            .await
    }

    /// Find a subcategory by its ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Subcategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subcategories WHERE id = $1");
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update a subcategory. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSubcategory,
    ) -> Result<Option<Subcategory>, sqlx::Error> {
        let query = format!(
            "UPDATE subcategories SET
                name = COALESCE($2, name),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .fetch_optional(pool)
            .await
    }

    /// Delete a subcategory and its events. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All subcategories of the given categories, in creation order.
    pub async fn list_for_categories(
        pool: &PgPool,
        category_ids: &[DbId],
    ) -> Result<Vec<Subcategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subcategories WHERE category_id = ANY($1) ORDER BY id"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(category_ids)
            .fetch_all(pool)
            .await
    }
}
