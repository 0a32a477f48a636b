//! Attendance engine and manager scopes.
//!
//! A sheet is keyed by (category, subcategory?, event, date, session).
//! The first submission creates and locks it; afterwards only an admin may
//! replace its entries, which bumps the sheet's revision. Certificate jobs
//! for the stored entries are queued in the same transaction.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use eventhub_core::attendance::{
    authorize, filter_to_roster, require_date, validate_session, validate_status,
    AttendanceCounts, Mark, DEFAULT_SESSION,
};
use eventhub_core::error::CoreError;
use eventhub_core::roles::{ROLE_ADMIN, ROLE_MANAGER};
use eventhub_core::schedule::parse_date;
use eventhub_core::types::DbId;
use eventhub_db::models::attendance::{
    AttendanceDocument, AttendanceEntry, AttendanceKey, AttendanceQuery, AttendanceSheet,
    AttendanceSummary, MyAttendanceRecord, SubmitAttendanceRequest,
};
use eventhub_db::models::catalog::{EventRef, ResolvedEvent};
use eventhub_db::models::manager_assignment::{
    AssignManagerRequest, ManagerAssignment, ManagerAssignmentDetail,
};
use eventhub_db::repositories::{
    AttendanceRepo, ManagerAssignmentRepo, RegistrationRepo, UserRepo,
};
use eventhub_db::DbPool;
use eventhub_notify::{
    attendance_idempotency_key, enqueue_certificates, CertificatePayload, EmailJob, KeyedJob,
};
use sqlx::PgConnection;

use super::catalog::resolve_event;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Outcome of a submission.
#[derive(Debug)]
pub struct Submission {
    pub sheet: AttendanceSheet,
    /// `false` when an admin replaced an existing sheet.
    pub created: bool,
    pub certificates_queued: u64,
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Whether `caller` may read or write attendance for `resolved`.
///
/// Admins always may; managers only with an assignment matching the exact
/// (category, subcategory, event) scope.
pub async fn is_authorized(
    conn: &mut PgConnection,
    caller: &AuthUser,
    resolved: &ResolvedEvent,
) -> AppResult<bool> {
    let has_assignment = caller.role == ROLE_MANAGER
        && ManagerAssignmentRepo::exists(
            &mut *conn,
            caller.user_id,
            resolved.category.id,
            resolved.subcategory.as_ref().map(|s| s.id),
            resolved.event.id,
        )
        .await?;
    Ok(eventhub_core::attendance::is_authorized(&caller.role, has_assignment))
}

async fn ensure_authorized(
    conn: &mut PgConnection,
    caller: &AuthUser,
    resolved: &ResolvedEvent,
) -> AppResult<()> {
    let allowed = is_authorized(conn, caller, resolved).await?;
    authorize(&caller.role, allowed)?;
    Ok(())
}

fn key_for(resolved: &ResolvedEvent, date: chrono::NaiveDate, session: String) -> AttendanceKey {
    AttendanceKey {
        category_id: resolved.category.id,
        subcategory_id: resolved.subcategory.as_ref().map(|s| s.id),
        event_id: resolved.event.id,
        date,
        session,
    }
}

fn build_sheet(
    key: AttendanceKey,
    event_title: String,
    document: Option<&AttendanceDocument>,
    entries: Vec<AttendanceEntry>,
) -> AttendanceSheet {
    AttendanceSheet {
        key,
        event_title,
        submitted: document.is_some(),
        document_id: document.map(|d| d.id),
        revision: document.map(|d| d.revision),
        submitted_by: document.map(|d| d.submitted_by),
        counts: AttendanceCounts::tally(entries.iter().map(|e| e.status.as_str())),
        entries,
    }
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

/// Read one sheet. A key with no submission yields an empty, unsubmitted
/// sheet. Missing `date` means today (UTC); missing `session` means
/// `full`.
pub async fn get_attendance(
    pool: &DbPool,
    caller: &AuthUser,
    query: &AttendanceQuery,
) -> AppResult<AttendanceSheet> {
    let date = match query.date.as_deref().map(str::trim) {
        None | Some("") => Utc::now().date_naive(),
        Some(raw) => parse_date(raw).map_err(CoreError::Validation)?,
    };
    let session = query.session.clone().unwrap_or_else(|| DEFAULT_SESSION.to_string());
    validate_session(&session)?;

    let mut conn = pool.acquire().await?;
    let resolved = resolve_event(
        &mut conn,
        &EventRef {
            category_id: query.category_id,
            subcategory_id: query.subcategory_id,
            event_id: query.event_id,
        },
    )
    .await?;
    ensure_authorized(&mut conn, caller, &resolved).await?;

    let key = key_for(&resolved, date, session);
    let document = AttendanceRepo::find_document(&mut *conn, &key).await?;
    let entries = match &document {
        Some(doc) => AttendanceRepo::list_entries(&mut *conn, doc.id).await?,
        None => Vec::new(),
    };
    Ok(build_sheet(key, resolved.event.title, document.as_ref(), entries))
}

/// Submit a sheet.
///
/// Entries for participants not on the event's roster are dropped. A first
/// submission locks the key; a later one fails with
/// [`CoreError::AlreadySubmitted`] unless the caller is an admin, whose
/// submission replaces every entry. One certificate job is queued per
/// stored entry whose participant has an email address.
pub async fn submit_attendance(
    pool: &DbPool,
    caller: &AuthUser,
    request: SubmitAttendanceRequest,
) -> AppResult<Submission> {
    let date = require_date(request.date.as_deref())?;
    validate_session(&request.session)?;
    for entry in &request.entries {
        validate_status(&entry.status)?;
    }

    let mut tx = pool.begin().await?;
    let resolved = resolve_event(
        &mut tx,
        &EventRef {
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            event_id: request.event_id,
        },
    )
    .await?;
    ensure_authorized(&mut tx, caller, &resolved).await?;

    let key = key_for(&resolved, date, request.session);
    let is_admin = caller.role == ROLE_ADMIN;
    let document = if is_admin {
        AttendanceRepo::upsert_overwrite(&mut tx, &key, caller.user_id).await?
    } else {
        AttendanceRepo::insert_if_absent(&mut tx, &key, caller.user_id)
            .await?
            .ok_or(CoreError::AlreadySubmitted)?
    };
    let created = document.revision == 1;

    let roster: HashSet<DbId> = RegistrationRepo::roster(&mut *tx, resolved.event.id)
        .await?
        .into_iter()
        .collect();
    let submitted = request.entries.len();
    let marks = filter_to_roster(
        request
            .entries
            .into_iter()
            .map(|e| Mark {
                user_id: e.user_id,
                status: e.status,
            })
            .collect(),
        &roster,
    );
    let entries = AttendanceRepo::replace_entries(&mut tx, document.id, &marks, caller.user_id).await?;

    let jobs = certificate_jobs(&mut tx, &document, &resolved.event.title, &entries).await?;
    let certificates_queued = enqueue_certificates(&mut tx, &jobs).await;

    tx.commit().await?;

    tracing::info!(
        user_id = caller.user_id,
        document_id = document.id,
        event_id = resolved.event.id,
        revision = document.revision,
        submitted,
        stored = entries.len(),
        certificates_queued,
        "Attendance submitted"
    );

    Ok(Submission {
        sheet: build_sheet(key, resolved.event.title, Some(&document), entries),
        created,
        certificates_queued,
    })
}

async fn certificate_jobs(
    conn: &mut PgConnection,
    document: &AttendanceDocument,
    event_title: &str,
    entries: &[AttendanceEntry],
) -> AppResult<Vec<KeyedJob>> {
    let ids: Vec<DbId> = entries.iter().map(|e| e.user_id).collect();
    let users: HashMap<DbId, _> = UserRepo::find_many(&mut *conn, &ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let user = users.get(&entry.user_id)?;
            if user.email.trim().is_empty() {
                return None;
            }
            Some(KeyedJob {
                idempotency_key: attendance_idempotency_key(
                    document.id,
                    document.revision,
                    user.id,
                ),
                job: EmailJob::certificate(CertificatePayload {
                    to_email: user.email.clone(),
                    full_name: user.full_name.clone(),
                    college: user.college.clone(),
                    college_id: user.college_id.clone(),
                    event_title: event_title.to_string(),
                }),
            })
        })
        .collect())
}

/// The caller's own attendance records, newest date first.
pub async fn list_my_attendance(
    pool: &DbPool,
    participant_id: DbId,
) -> AppResult<Vec<MyAttendanceRecord>> {
    Ok(AttendanceRepo::list_for_user(pool, participant_id).await?)
}

/// Every sheet with tallies, newest date first.
pub async fn list_all_attendance(pool: &DbPool) -> AppResult<Vec<AttendanceSummary>> {
    Ok(AttendanceRepo::list_summaries(pool).await?)
}

// ---------------------------------------------------------------------------
// Manager assignments
// ---------------------------------------------------------------------------

/// Grant a manager attendance rights over one event. Idempotent.
pub async fn assign_manager(
    pool: &DbPool,
    request: &AssignManagerRequest,
) -> AppResult<ManagerAssignment> {
    let mut conn = pool.acquire().await?;
    let manager = UserRepo::find_by_id(&mut *conn, request.manager_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: request.manager_id,
        })?;
    if manager.role != ROLE_MANAGER {
        return Err(CoreError::Validation(format!(
            "User {} is not a manager",
            manager.id
        ))
        .into());
    }

    let resolved = resolve_event(
        &mut conn,
        &EventRef {
            category_id: request.category_id,
            subcategory_id: request.subcategory_id,
            event_id: request.event_id,
        },
    )
    .await?;
    drop(conn);

    let assignment = ManagerAssignmentRepo::upsert(
        pool,
        manager.id,
        resolved.category.id,
        resolved.subcategory.as_ref().map(|s| s.id),
        resolved.event.id,
    )
    .await?;

    tracing::info!(
        manager_id = manager.id,
        event_id = resolved.event.id,
        assignment_id = assignment.id,
        "Manager assigned"
    );
    Ok(assignment)
}

pub async fn list_assignments(pool: &DbPool) -> AppResult<Vec<ManagerAssignmentDetail>> {
    Ok(ManagerAssignmentRepo::list_all(pool).await?)
}

pub async fn list_manager_assignments(
    pool: &DbPool,
    manager_id: DbId,
) -> AppResult<Vec<ManagerAssignmentDetail>> {
    Ok(ManagerAssignmentRepo::list_for_manager(pool, manager_id).await?)
}

pub async fn remove_assignment(pool: &DbPool, id: DbId) -> AppResult<()> {
    if !ManagerAssignmentRepo::delete(pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "ManagerAssignment",
            id,
        }
        .into());
    }
    tracing::info!(assignment_id = id, "Manager assignment removed");
    Ok(())
}
