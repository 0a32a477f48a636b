//! Admin-only routes outside the catalog.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{attendance, manager_assignment};
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// ```text
/// PUT    /manager-assignments        -> assign
/// GET    /manager-assignments        -> list
/// DELETE /manager-assignments/{id}   -> remove
/// GET    /attendance                 -> list_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/manager-assignments",
            get(manager_assignment::list).put(manager_assignment::assign),
        )
        .route(
            "/manager-assignments/{id}",
            delete(manager_assignment::remove),
        )
        .route("/attendance", get(attendance::list_all))
}
