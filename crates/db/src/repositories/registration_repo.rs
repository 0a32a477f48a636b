//! Repository for the `event_registrations` table (event rosters).

use eventhub_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::registration::{RegisteredEvent, Registration};

/// Select list for a participant's registered events.
const REGISTERED_EVENT_SELECT: &str = "SELECT e.id AS event_id, e.category_id, e.subcategory_id, \
    e.seq_id, e.title, e.venue, e.event_date, e.start_time, e.end_time, r.registered_at \
    FROM event_registrations r JOIN events e ON e.id = r.event_id";

/// Provides roster membership operations.
pub struct RegistrationRepo;

impl RegistrationRepo {
    /// Whether the participant is on the event's roster.
    pub async fn is_registered<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM event_registrations WHERE event_id = $1 AND user_id = $2
             )",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Current roster size of an event.
    pub async fn count_for_event<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM event_registrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(executor)
            .await
    }

    /// Participant IDs on an event's roster, in registration order.
    pub async fn roster<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT user_id FROM event_registrations WHERE event_id = $1
             ORDER BY registered_at, user_id",
        )
        .bind(event_id)
        .fetch_all(executor)
        .await
    }

    /// Every event the participant is registered for, across the whole
    /// catalog, ordered by date and start time.
    pub async fn list_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Vec<RegisteredEvent>, sqlx::Error> {
        let query = format!(
            "{REGISTERED_EVENT_SELECT}
             WHERE r.user_id = $1
             ORDER BY e.event_date, e.start_time, e.id"
        );
        sqlx::query_as::<_, RegisteredEvent>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// Add a participant to a roster.
    ///
    /// Callers must hold the event row lock (see
    /// [`EventRepo::lock`](crate::repositories::EventRepo::lock)) and have
    /// checked capacity in the same transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Registration, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            "INSERT INTO event_registrations (event_id, user_id) VALUES ($1, $2)
             RETURNING event_id, user_id, registered_at",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    /// Remove a participant from a roster, returning the removed row if
    /// they were on it.
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Registration>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            "DELETE FROM event_registrations WHERE event_id = $1 AND user_id = $2
             RETURNING event_id, user_id, registered_at",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }
}
