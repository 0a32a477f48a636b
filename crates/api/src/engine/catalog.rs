//! Event reference resolution and catalog reads.

use eventhub_core::catalog::{clamp_page, page_offset};
use eventhub_core::error::CoreError;
use eventhub_core::types::DbId;
use eventhub_db::models::catalog::{CatalogPage, CategoryTree, EventRef, ResolvedEvent};
use eventhub_db::repositories::{CategoryRepo, EventRepo, SubcategoryRepo};
use eventhub_db::DbPool;
use sqlx::PgConnection;

use crate::cache::{page_key, EventListCache};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;

/// Resolve `(category, subcategory?, event seq id)` to the stored rows.
///
/// Takes a connection so callers can resolve inside their own transaction.
///
/// Fails with a distinct [`CoreError::NotFound`] entity for a missing
/// category, a missing (or foreign) subcategory, and a missing event.
pub async fn resolve_event(
    conn: &mut PgConnection,
    event_ref: &EventRef,
) -> AppResult<ResolvedEvent> {
    let category = CategoryRepo::find_by_id(&mut *conn, event_ref.category_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Category",
            id: event_ref.category_id,
        })?;

    let subcategory = match event_ref.subcategory_id {
        Some(sub_id) => {
            let sub = SubcategoryRepo::find_by_id(&mut *conn, sub_id)
                .await?
                .filter(|s| s.category_id == category.id)
                .ok_or(CoreError::NotFound {
                    entity: "Subcategory",
                    id: sub_id,
                })?;
            Some(sub)
        }
        None => None,
    };

    let event = EventRepo::find_in_list(
        &mut *conn,
        category.id,
        subcategory.as_ref().map(|s| s.id),
        event_ref.event_id,
    )
    .await?
    .ok_or(CoreError::NotFound {
        entity: "Event",
        id: DbId::from(event_ref.event_id),
    })?;

    Ok(ResolvedEvent {
        category,
        subcategory,
        event,
    })
}

/// One category with its subcategories and events.
pub async fn get_category(pool: &DbPool, id: DbId) -> AppResult<CategoryTree> {
    let category = CategoryRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Category",
            id,
        })?;
    CategoryRepo::load_trees(pool, vec![category])
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalError(format!("Category {id} vanished while loading")))
}

/// Serve one page of the catalog as a JSON body, read through the cache.
pub async fn list_events_json(
    pool: &DbPool,
    cache: &dyn EventListCache,
    config: &ServerConfig,
    page: Option<i64>,
    limit: Option<i64>,
) -> AppResult<String> {
    let (page, limit) = clamp_page(page, limit);
    let key = page_key(page, limit);

    match cache.get(&key).await {
        Ok(Some(body)) => {
            tracing::debug!(page, limit, "Event list cache hit");
            return Ok(body);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, key = %key, "Event list cache read failed"),
    }

    let total = CategoryRepo::count(pool).await?;
    let categories = CategoryRepo::list_page(pool, limit, page_offset(page, limit)).await?;
    let categories = CategoryRepo::load_trees(pool, categories).await?;
    let body = serde_json::to_string(&DataResponse {
        data: CatalogPage {
            page,
            limit,
            total,
            categories,
        },
    })
    .map_err(|e| AppError::InternalError(format!("Failed to render event list: {e}")))?;

    if let Err(e) = cache.set(&key, &body, config.event_list_cache_ttl).await {
        tracing::warn!(error = %e, key = %key, "Event list cache write failed");
    }
    Ok(body)
}
