pub mod admin;
pub mod attendance;
pub mod catalog;
pub mod health;
pub mod registration;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /events                                   list catalog page (public, cached)
/// /categories/{id}                          get category tree (public)
///
/// /admin/categories                         create (admin only)
/// /admin/categories/{id}                    update, delete (cascade)
/// /admin/categories/{id}/subcategories      create subcategory
/// /admin/categories/{id}/events             create event
/// /admin/subcategories/{id}                 update, delete
/// /admin/events/{id}                        update, delete
/// /admin/manager-assignments                list, assign (GET, PUT)
/// /admin/manager-assignments/{id}           remove (DELETE)
/// /admin/attendance                         list every sheet (GET)
///
/// /registrations                            register (POST, auth required)
/// /registrations/withdraw                   unregister (POST)
/// /registrations/me                         caller's events (GET)
///
/// /attendance                               get, submit sheet (manager or admin)
/// /attendance/me                            caller's records (GET)
///
/// /manager/assignments                      caller's scopes (manager)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Public catalog reads.
        .merge(catalog::public_router())
        // Admin catalog management and administration.
        .nest("/admin", catalog::admin_router().merge(admin::router()))
        // Participant registration.
        .nest("/registrations", registration::router())
        // Attendance sheets.
        .nest("/attendance", attendance::router())
        .nest("/manager", attendance::manager_router())
}
