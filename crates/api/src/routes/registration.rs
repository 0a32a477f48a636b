//! Route definitions for participant registration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::registration;
use crate::state::AppState;

/// Registration routes mounted at `/registrations`.
///
/// ```text
/// POST /            -> register
/// POST /withdraw    -> unregister
/// GET  /me          -> list_mine
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(registration::register))
        .route("/withdraw", post(registration::unregister))
        .route("/me", get(registration::list_mine))
}
