//! Handlers for manager attendance scopes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eventhub_core::types::DbId;
use eventhub_db::models::manager_assignment::AssignManagerRequest;

use crate::engine::attendance as engine;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::response::DataResponse;
use crate::state::AppState;

/// PUT /api/v1/admin/manager-assignments
///
/// Idempotent: assigning an existing scope returns the stored row.
pub async fn assign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<AssignManagerRequest>,
) -> AppResult<impl IntoResponse> {
    let assignment = engine::assign_manager(&state.pool, &request).await?;

    tracing::debug!(user_id = admin.user_id, assignment_id = assignment.id, "Assignment stored");

    Ok(Json(DataResponse { data: assignment }))
}

/// GET /api/v1/admin/manager-assignments
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let assignments = engine::list_assignments(&state.pool).await?;
    Ok(Json(DataResponse { data: assignments }))
}

/// DELETE /api/v1/admin/manager-assignments/{id}
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    engine::remove_assignment(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/manager/assignments
///
/// The caller's own scopes. An admin sees an empty list.
pub async fn list_mine(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let assignments = engine::list_manager_assignments(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: assignments }))
}
