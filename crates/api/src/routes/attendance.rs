//! Route definitions for attendance sheets and manager scopes.

use axum::routing::get;
use axum::Router;

use crate::handlers::{attendance, manager_assignment};
use crate::state::AppState;

/// Attendance routes mounted at `/attendance`.
///
/// ```text
/// GET  /     -> get_sheet (?category_id, subcategory_id, event_id, date, session)
/// POST /     -> submit
/// GET  /me   -> list_mine
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(attendance::get_sheet).post(attendance::submit))
        .route("/me", get(attendance::list_mine))
}

/// Manager self-service routes mounted at `/manager`.
///
/// ```text
/// GET /assignments   -> list_mine
/// ```
pub fn manager_router() -> Router<AppState> {
    Router::new().route("/assignments", get(manager_assignment::list_mine))
}
