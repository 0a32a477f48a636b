//! Route definitions for the event catalog.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Public catalog reads mounted at the API root.
///
/// ```text
/// GET /events            -> list_events (?page, limit)
/// GET /categories/{id}   -> get_category
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(catalog::list_events))
        .route("/categories/{id}", get(catalog::get_category))
}

/// Admin catalog management mounted at `/admin`.
///
/// ```text
/// POST   /categories                      -> create_category
/// PUT    /categories/{id}                 -> update_category
/// DELETE /categories/{id}                 -> delete_category
/// POST   /categories/{id}/subcategories   -> create_subcategory
/// PUT    /subcategories/{id}              -> update_subcategory
/// DELETE /subcategories/{id}              -> delete_subcategory
/// POST   /categories/{id}/events          -> create_event
/// PUT    /events/{id}                     -> update_event
/// DELETE /events/{id}                     -> delete_event
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/categories", post(catalog::create_category))
        .route(
            "/categories/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route(
            "/categories/{id}/subcategories",
            post(catalog::create_subcategory),
        )
        .route(
            "/subcategories/{id}",
            put(catalog::update_subcategory).delete(catalog::delete_subcategory),
        )
        .route("/categories/{id}/events", post(catalog::create_event))
        .route(
            "/events/{id}",
            put(catalog::update_event).delete(catalog::delete_event),
        )
}
