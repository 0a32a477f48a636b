//! Registration engine.
//!
//! `register` runs in one transaction holding row locks on the participant
//! and the event, so the duplicate, capacity and schedule checks see the
//! same state the insert commits against. Registrations for one event
//! serialise on the event row; registrations by one participant serialise
//! on the participant row. Locks are always taken participant first.

use eventhub_core::error::CoreError;
use eventhub_core::registration::{check_capacity, check_eligibility, Eligibility};
use eventhub_core::schedule::{find_conflict, Booking, TimeWindow};
use eventhub_core::types::DbId;
use eventhub_db::models::catalog::EventRef;
use eventhub_db::models::registration::{RegisteredEvent, Registration};
use eventhub_db::repositories::{EventRepo, RegistrationRepo, UserRepo};
use eventhub_db::DbPool;

use super::catalog::resolve_event;
use crate::error::AppResult;

/// Enroll `participant_id` in the referenced event.
///
/// Checks, in order: eligibility, event resolution, duplicate membership,
/// capacity, and schedule conflicts across every event the participant
/// already holds.
pub async fn register(
    pool: &DbPool,
    institution_domain: &str,
    participant_id: DbId,
    event_ref: &EventRef,
) -> AppResult<Registration> {
    let mut tx = pool.begin().await?;

    let participant = UserRepo::lock_by_id(&mut tx, participant_id)
        .await?
        .ok_or_else(|| CoreError::NotEligible("Participant account not found".into()))?;
    check_eligibility(
        &Eligibility {
            email: &participant.email,
            is_approved: participant.is_approved,
            payment_status: &participant.payment_status,
        },
        institution_domain,
    )?;

    let resolved = resolve_event(&mut tx, event_ref).await?;
    let event = EventRepo::lock(&mut tx, resolved.event.id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Event",
            id: DbId::from(event_ref.event_id),
        })?;

    if RegistrationRepo::is_registered(&mut *tx, event.id, participant.id).await? {
        return Err(CoreError::AlreadyRegistered.into());
    }

    let roster_size = RegistrationRepo::count_for_event(&mut *tx, event.id).await?;
    check_capacity(roster_size, event.max_participants)?;

    let held: Vec<Booking> = RegistrationRepo::list_for_user(&mut *tx, participant.id)
        .await?
        .iter()
        .map(RegisteredEvent::booking)
        .collect();
    let candidate = TimeWindow {
        date: event.event_date,
        start: event.start_time,
        end: event.end_time,
    };
    if let Some(clash) = find_conflict(&candidate, &held) {
        return Err(clash.conflict_error().into());
    }

    let registration = RegistrationRepo::insert(&mut tx, event.id, participant.id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = participant.id,
        event_id = event.id,
        category_id = event.category_id,
        roster_size = roster_size + 1,
        cap = event.max_participants,
        "Participant registered"
    );
    Ok(registration)
}

/// Withdraw `participant_id` from the referenced event.
///
/// Eligibility is not re-checked.
pub async fn unregister(
    pool: &DbPool,
    participant_id: DbId,
    event_ref: &EventRef,
) -> AppResult<Registration> {
    let mut conn = pool.acquire().await?;
    let resolved = resolve_event(&mut conn, event_ref).await?;
    let removed = RegistrationRepo::delete(&mut *conn, resolved.event.id, participant_id)
        .await?
        .ok_or(CoreError::NotRegistered)?;

    tracing::info!(
        user_id = participant_id,
        event_id = resolved.event.id,
        "Participant unregistered"
    );
    Ok(removed)
}

/// Events the participant is registered for, by date then start time.
pub async fn list_my_registrations(
    pool: &DbPool,
    participant_id: DbId,
) -> AppResult<Vec<RegisteredEvent>> {
    Ok(RegistrationRepo::list_for_user(pool, participant_id).await?)
}
