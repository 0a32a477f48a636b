use std::sync::Arc;

use crate::cache::EventListCache;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: eventhub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Rendered catalog pages (Redis or in-process).
    pub event_cache: Arc<dyn EventListCache>,
}
