//! Repository for the `events` table.

use eventhub_core::catalog::{next_seq_id, DEFAULT_MAX_PARTICIPANTS, TAG_TECHNICAL};
use eventhub_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::catalog::{CreateEvent, Event, EventWithCount, UpdateEvent};

/// Column list for events queries.
const COLUMNS: &str = "id, category_id, subcategory_id, seq_id, title, description, venue, \
    event_date, start_time, end_time, max_participants, category_tag, created_at, updated_at";

/// Provides CRUD and lookup operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event at the end of its owning list.
    ///
    /// The sequence id is `max(seq_id) + 1` within (category, subcategory).
    /// The category row is locked for the duration so concurrent creates in
    /// the same category cannot pick the same sequence id.
    pub async fn create(
        pool: &PgPool,
        category_id: DbId,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(category_id)
            .fetch_one(&mut *tx)
            .await?;

        let current_max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(seq_id) FROM events
             WHERE category_id = $1 AND subcategory_id IS NOT DISTINCT FROM $2",
        )
        .bind(category_id)
        .bind(input.subcategory_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO events
                (category_id, subcategory_id, seq_id, title, description, venue,
                 event_date, start_time, end_time, max_participants, category_tag)
             VALUES ($1, $2, $3, $4, COALESCE($5, ''), COALESCE($6, ''), $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(category_id)
            .bind(input.subcategory_id)
            .bind(next_seq_id(current_max))
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.venue)
            .bind(input.event_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS))
            .bind(input.category_tag.as_deref().unwrap_or(TAG_TECHNICAL))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(event)
    }

    /// Find an event by its database ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find an event by its sequence id within an owning list.
    ///
    /// `subcategory_id = None` addresses the category's direct events.
    pub async fn find_in_list<'e>(
        executor: impl PgExecutor<'e>,
        category_id: DbId,
        subcategory_id: Option<DbId>,
        seq_id: i32,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE category_id = $1 AND subcategory_id IS NOT DISTINCT FROM $2 AND seq_id = $3"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(category_id)
            .bind(subcategory_id)
            .bind(seq_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock an event row until the transaction ends.
    ///
    /// Serialises concurrent registrations for one event so the capacity
    /// check and the roster insert behave as a single step.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Update an event. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                venue = COALESCE($4, venue),
                event_date = COALESCE($5, event_date),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                max_participants = COALESCE($8, max_participants),
                category_tag = COALESCE($9, category_tag),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.venue)
            .bind(input.event_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_participants)
            .bind(&input.category_tag)
            .fetch_optional(pool)
            .await
    }

    /// Delete an event and its roster. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All events of the given categories with their roster sizes.
    ///
    /// Direct events come first, then each subcategory's events; within a
    /// list events are in sequence order.
    pub async fn list_for_categories_with_counts(
        pool: &PgPool,
        category_ids: &[DbId],
    ) -> Result<Vec<EventWithCount>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS},
                (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = events.id)
                    AS registered_count
             FROM events
             WHERE category_id = ANY($1)
             ORDER BY category_id, subcategory_id NULLS FIRST, seq_id"
        );
        sqlx::query_as::<_, EventWithCount>(&query)
            .bind(category_ids)
            .fetch_all(pool)
            .await
    }
}
