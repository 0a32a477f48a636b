//! Handlers for participant registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eventhub_db::models::catalog::EventRef;

use crate::cache::invalidate_event_list;
use crate::engine::registration as engine;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/registrations
///
/// Register the caller for the referenced event.
pub async fn register(
    user: AuthUser,
    State(state): State<AppState>,
    Json(event_ref): Json<EventRef>,
) -> AppResult<impl IntoResponse> {
    let registration = engine::register(
        &state.pool,
        &state.config.institution_email_domain,
        user.user_id,
        &event_ref,
    )
    .await?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: registration })))
}

/// POST /api/v1/registrations/withdraw
///
/// Remove the caller from the referenced event's roster.
pub async fn unregister(
    user: AuthUser,
    State(state): State<AppState>,
    Json(event_ref): Json<EventRef>,
) -> AppResult<impl IntoResponse> {
    let removed = engine::unregister(&state.pool, user.user_id, &event_ref).await?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    Ok(Json(DataResponse { data: removed }))
}

/// GET /api/v1/registrations/me
pub async fn list_mine(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let events = engine::list_my_registrations(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: events }))
}
