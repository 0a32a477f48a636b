//! Handlers for attendance sheets.
//!
//! Reading and submitting a sheet require the manager or admin role; the
//! engine additionally checks a manager's assignment scope.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eventhub_db::models::attendance::{AttendanceQuery, SubmitAttendanceRequest};

use crate::engine::attendance as engine;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/attendance?category_id=&subcategory_id=&event_id=&date=&session=
pub async fn get_sheet(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<impl IntoResponse> {
    let sheet = engine::get_attendance(&state.pool, &user, &query).await?;
    Ok(Json(DataResponse { data: sheet }))
}

/// POST /api/v1/attendance
///
/// 201 for a first submission, 200 when an admin replaced an existing
/// sheet.
pub async fn submit(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Json(request): Json<SubmitAttendanceRequest>,
) -> AppResult<impl IntoResponse> {
    let submission = engine::submit_attendance(&state.pool, &user, request).await?;
    let status = if submission.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: submission.sheet })))
}

/// GET /api/v1/attendance/me
pub async fn list_mine(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let records = engine::list_my_attendance(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/admin/attendance
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summaries = engine::list_all_attendance(&state.pool).await?;
    Ok(Json(DataResponse { data: summaries }))
}
