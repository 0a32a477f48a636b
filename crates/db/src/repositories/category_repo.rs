//! Repository for the `categories` table and catalog tree assembly.

use std::collections::HashMap;

use eventhub_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::catalog::{
    Category, CategoryTree, CreateCategory, SubcategoryTree, UpdateCategory,
};
use crate::repositories::{EventRepo, SubcategoryRepo};

/// Column list for categories queries.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        let query = format!("INSERT INTO categories (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Category>(&query)
            .bind(input.name.trim())
            .fetch_one(pool)
            .await
    }

    /// Find a category by its ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update a category. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .fetch_optional(pool)
            .await
    }

    /// Delete a category and, by cascade, everything beneath it.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of categories.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(pool)
            .await
    }

    /// One page of categories ordered by ID.
    pub async fn list_page(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, Category>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Assemble categories into trees of subcategories and events.
    ///
    /// Issues one query per level regardless of how many categories are
    /// passed in.
    pub async fn load_trees(
        pool: &PgPool,
        categories: Vec<Category>,
    ) -> Result<Vec<CategoryTree>, sqlx::Error> {
        let ids: Vec<DbId> = categories.iter().map(|c| c.id).collect();
        let subcategories = SubcategoryRepo::list_for_categories(pool, &ids).await?;
        let events = EventRepo::list_for_categories_with_counts(pool, &ids).await?;

        let mut direct: HashMap<DbId, Vec<_>> = HashMap::new();
        let mut nested: HashMap<DbId, Vec<_>> = HashMap::new();
        for e in events {
            match e.event.subcategory_id {
                Some(sub_id) => nested.entry(sub_id).or_default().push(e),
                None => direct.entry(e.event.category_id).or_default().push(e),
            }
        }

        let mut subs_by_category: HashMap<DbId, Vec<SubcategoryTree>> = HashMap::new();
        for sub in subcategories {
            let events = nested.remove(&sub.id).unwrap_or_default();
            subs_by_category
                .entry(sub.category_id)
                .or_default()
                .push(SubcategoryTree {
                    subcategory: sub,
                    events,
                });
        }

        Ok(categories
            .into_iter()
            .map(|category| CategoryTree {
                events: direct.remove(&category.id).unwrap_or_default(),
                subcategories: subs_by_category.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect())
    }
}
