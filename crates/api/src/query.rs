//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Page-based pagination parameters (`?page=&limit=`).
///
/// Values are normalised by [`eventhub_core::catalog::clamp_page`].
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
