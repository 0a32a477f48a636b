//! Repository for the `attendance_documents` and `attendance_entries` tables.

use eventhub_core::attendance::Mark;
use eventhub_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::attendance::{
    AttendanceDocument, AttendanceEntry, AttendanceKey, AttendanceSummary, MyAttendanceRecord,
};

/// Column list for attendance_documents queries.
const DOCUMENT_COLUMNS: &str = "id, category_id, subcategory_id, event_id, attendance_date, \
    session, submitted_by, revision, created_at, updated_at";

/// Column list for attendance_entries queries.
const ENTRY_COLUMNS: &str = "id, document_id, user_id, status, marked_by, marked_at";

/// Provides operations on attendance sheets.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Find the sheet stored under a key.
    pub async fn find_document<'e>(
        executor: impl PgExecutor<'e>,
        key: &AttendanceKey,
    ) -> Result<Option<AttendanceDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM attendance_documents
             WHERE category_id = $1
               AND subcategory_id IS NOT DISTINCT FROM $2
               AND event_id = $3
               AND attendance_date = $4
               AND session = $5"
        );
        sqlx::query_as::<_, AttendanceDocument>(&query)
            .bind(key.category_id)
            .bind(key.subcategory_id)
            .bind(key.event_id)
            .bind(key.date)
            .bind(&key.session)
            .fetch_optional(executor)
            .await
    }

    /// Entries of a sheet in marking order.
    pub async fn list_entries<'e>(
        executor: impl PgExecutor<'e>,
        document_id: DbId,
    ) -> Result<Vec<AttendanceEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM attendance_entries WHERE document_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, AttendanceEntry>(&query)
            .bind(document_id)
            .fetch_all(executor)
            .await
    }

    /// Create the sheet only if no sheet exists for the key.
    ///
    /// Returns `None` when another submission already holds the key, so
    /// concurrent first submissions resolve to exactly one winner.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        key: &AttendanceKey,
        submitted_by: DbId,
    ) -> Result<Option<AttendanceDocument>, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_documents
                (category_id, subcategory_id, event_id, attendance_date, session, submitted_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_attendance_documents_key DO NOTHING
             RETURNING {DOCUMENT_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceDocument>(&query)
            .bind(key.category_id)
            .bind(key.subcategory_id)
            .bind(key.event_id)
            .bind(key.date)
            .bind(&key.session)
            .bind(submitted_by)
            .fetch_optional(conn)
            .await
    }

    /// Create the sheet, or take over an existing one and bump its revision.
    pub async fn upsert_overwrite(
        conn: &mut PgConnection,
        key: &AttendanceKey,
        submitted_by: DbId,
    ) -> Result<AttendanceDocument, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_documents
                (category_id, subcategory_id, event_id, attendance_date, session, submitted_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_attendance_documents_key DO UPDATE SET
                submitted_by = EXCLUDED.submitted_by,
                revision = attendance_documents.revision + 1,
                updated_at = NOW()
             RETURNING {DOCUMENT_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceDocument>(&query)
            .bind(key.category_id)
            .bind(key.subcategory_id)
            .bind(key.event_id)
            .bind(key.date)
            .bind(&key.session)
            .bind(submitted_by)
            .fetch_one(conn)
            .await
    }

    /// Replace every entry of a sheet with `marks` (full replace, not merge).
    pub async fn replace_entries(
        conn: &mut PgConnection,
        document_id: DbId,
        marks: &[Mark],
        marked_by: DbId,
    ) -> Result<Vec<AttendanceEntry>, sqlx::Error> {
        sqlx::query("DELETE FROM attendance_entries WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *conn)
            .await?;

        let user_ids: Vec<DbId> = marks.iter().map(|m| m.user_id).collect();
        let statuses: Vec<String> = marks.iter().map(|m| m.status.clone()).collect();

        let query = format!(
            "INSERT INTO attendance_entries (document_id, user_id, status, marked_by)
             SELECT $1, m.user_id, m.status, $4
             FROM UNNEST($2::BIGINT[], $3::TEXT[]) WITH ORDINALITY AS m(user_id, status, ord)
             ORDER BY m.ord
             RETURNING {ENTRY_COLUMNS}"
        );
        let mut entries = sqlx::query_as::<_, AttendanceEntry>(&query)
            .bind(document_id)
            .bind(&user_ids)
            .bind(&statuses)
            .bind(marked_by)
            .fetch_all(&mut *conn)
            .await?;
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    /// Every attendance record of one participant, newest date first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<MyAttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, MyAttendanceRecord>(
            "SELECT d.id AS document_id, d.event_id, e.title AS event_title,
                    d.attendance_date, d.session, en.status, en.marked_at
             FROM attendance_entries en
             JOIN attendance_documents d ON d.id = en.document_id
             JOIN events e ON e.id = d.event_id
             WHERE en.user_id = $1
             ORDER BY d.attendance_date DESC, d.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Every sheet with present/absent tallies, newest date first.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<AttendanceSummary>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceSummary>(
            "SELECT d.id, d.category_id, d.subcategory_id, d.event_id, d.attendance_date,
                    d.session, d.submitted_by, d.revision, d.created_at, d.updated_at,
                    e.title AS event_title,
                    COUNT(en.id) FILTER (WHERE en.status = 'present') AS present,
                    COUNT(en.id) FILTER (WHERE en.status = 'absent') AS absent,
                    COUNT(en.id) AS total
             FROM attendance_documents d
             JOIN events e ON e.id = d.event_id
             LEFT JOIN attendance_entries en ON en.document_id = d.id
             GROUP BY d.id, e.title
             ORDER BY d.attendance_date DESC, d.id DESC",
        )
        .fetch_all(pool)
        .await
    }
}
