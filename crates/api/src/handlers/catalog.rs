//! Handlers for the event catalog: public reads and admin CRUD.
//!
//! Every mutation drops the cached catalog pages.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use eventhub_core::catalog::{validate_max_participants, validate_name, validate_tag};
use eventhub_core::error::CoreError;
use eventhub_core::schedule::TimeWindow;
use eventhub_core::types::DbId;
use eventhub_db::models::catalog::{
    CreateCategory, CreateEvent, CreateSubcategory, UpdateCategory, UpdateEvent,
    UpdateSubcategory,
};
use eventhub_db::repositories::{CategoryRepo, EventRepo, SubcategoryRepo};
use validator::Validate;

use crate::cache::invalidate_event_list;
use crate::engine::catalog as engine;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/events?page=&limit=
///
/// One page of categories with their subcategories and events. Served from
/// the event list cache when warm.
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let body = engine::list_events_json(
        &state.pool,
        state.event_cache.as_ref(),
        &state.config,
        params.page,
        params.limit,
    )
    .await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tree = engine::get_category(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tree }))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/categories
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_name("name", &input.name).map_err(CoreError::Validation)?;

    let category = CategoryRepo::create(&state.pool, &input).await?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(
        category_id = category.id,
        name = %category.name,
        user_id = admin.user_id,
        "Category created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/admin/categories/{id}
pub async fn update_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(name) = &input.name {
        validate_name("name", name).map_err(CoreError::Validation)?;
    }

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Category", id))?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(category_id = id, user_id = admin.user_id, "Category updated");

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/admin/categories/{id}
///
/// Cascades to subcategories, events, rosters, manager assignments and
/// attendance sheets.
pub async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(not_found("Category", id));
    }
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(category_id = id, user_id = admin.user_id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subcategories
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/categories/{id}/subcategories
pub async fn create_subcategory(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Json(input): Json<CreateSubcategory>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_name("name", &input.name).map_err(CoreError::Validation)?;

    CategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .ok_or_else(|| not_found("Category", category_id))?;

    let subcategory = SubcategoryRepo::create(&state.pool, category_id, &input).await?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(
        subcategory_id = subcategory.id,
        category_id,
        user_id = admin.user_id,
        "Subcategory created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: subcategory })))
}

/// PUT /api/v1/admin/subcategories/{id}
pub async fn update_subcategory(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSubcategory>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(name) = &input.name {
        validate_name("name", name).map_err(CoreError::Validation)?;
    }

    let subcategory = SubcategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Subcategory", id))?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(subcategory_id = id, user_id = admin.user_id, "Subcategory updated");

    Ok(Json(DataResponse { data: subcategory }))
}

/// DELETE /api/v1/admin/subcategories/{id}
pub async fn delete_subcategory(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !SubcategoryRepo::delete(&state.pool, id).await? {
        return Err(not_found("Subcategory", id));
    }
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(subcategory_id = id, user_id = admin.user_id, "Subcategory deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/categories/{id}/events
///
/// Creates the event in the category's direct list, or in the subcategory
/// named by `subcategory_id`. The new event gets the next sequence id of
/// that list.
pub async fn create_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Json(input): Json<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_name("title", &input.title).map_err(CoreError::Validation)?;
    TimeWindow::new(input.event_date, input.start_time, input.end_time)
        .map_err(CoreError::Validation)?;
    if let Some(cap) = input.max_participants {
        validate_max_participants(cap).map_err(CoreError::Validation)?;
    }
    if let Some(tag) = &input.category_tag {
        validate_tag(tag).map_err(CoreError::Validation)?;
    }

    CategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .ok_or_else(|| not_found("Category", category_id))?;
    if let Some(sub_id) = input.subcategory_id {
        SubcategoryRepo::find_by_id(&state.pool, sub_id)
            .await?
            .filter(|s| s.category_id == category_id)
            .ok_or_else(|| not_found("Subcategory", sub_id))?;
    }

    let event = EventRepo::create(&state.pool, category_id, &input).await?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(
        event_id = event.id,
        seq_id = event.seq_id,
        category_id,
        subcategory_id = ?event.subcategory_id,
        user_id = admin.user_id,
        "Event created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// PUT /api/v1/admin/events/{id}
///
/// Partial update. The resulting schedule is checked against the stored
/// values for any field left out.
pub async fn update_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(title) = &input.title {
        validate_name("title", title).map_err(CoreError::Validation)?;
    }
    if let Some(cap) = input.max_participants {
        validate_max_participants(cap).map_err(CoreError::Validation)?;
    }
    if let Some(tag) = &input.category_tag {
        validate_tag(tag).map_err(CoreError::Validation)?;
    }

    let existing = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Event", id))?;
    TimeWindow::new(
        input.event_date.unwrap_or(existing.event_date),
        input.start_time.unwrap_or(existing.start_time),
        input.end_time.unwrap_or(existing.end_time),
    )
    .map_err(CoreError::Validation)?;

    let event = EventRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Event", id))?;
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(event_id = id, user_id = admin.user_id, "Event updated");

    Ok(Json(DataResponse { data: event }))
}

/// DELETE /api/v1/admin/events/{id}
pub async fn delete_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !EventRepo::delete(&state.pool, id).await? {
        return Err(not_found("Event", id));
    }
    invalidate_event_list(state.event_cache.as_ref()).await;

    tracing::info!(event_id = id, user_id = admin.user_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
