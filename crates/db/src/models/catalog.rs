//! Category, subcategory and event models.

use chrono::{NaiveDate, NaiveTime};
use eventhub_core::schedule::hhmm;
use eventhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `subcategories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subcategory {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    /// Position within the owning list (direct events or one subcategory).
    pub seq_id: i32,
    pub title: String,
    pub description: String,
    pub venue: String,
    pub event_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub max_participants: i32,
    pub category_tag: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An event together with its current roster size.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub registered_count: i64,
}

/// A subcategory with its events, as rendered in catalog listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryTree {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    pub events: Vec<EventWithCount>,
}

/// A category with its direct events and subcategories.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub events: Vec<EventWithCount>,
    pub subcategories: Vec<SubcategoryTree>,
}

/// One page of the catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub categories: Vec<CategoryTree>,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// DTO for updating a category. All fields optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

/// DTO for creating a subcategory under a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubcategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// DTO for updating a subcategory. All fields optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSubcategory {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

/// DTO for creating an event in a category's direct list or in one of
/// its subcategories.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEvent {
    pub subcategory_id: Option<DbId>,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub event_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,
    pub category_tag: Option<String>,
}

/// DTO for updating an event. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,
    pub category_tag: Option<String>,
}

/// Reference to an event inside the catalog.
///
/// `event_id` is the event's sequence id within its owning list: the
/// category's direct events when `subcategory_id` is `None`, otherwise the
/// named subcategory's events.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EventRef {
    pub category_id: DbId,
    pub subcategory_id: Option<DbId>,
    pub event_id: i32,
}

/// A resolved [`EventRef`]: every level of the path exists.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEvent {
    pub category: Category,
    pub subcategory: Option<Subcategory>,
    pub event: Event,
}
