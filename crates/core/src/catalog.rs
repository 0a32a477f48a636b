//! Catalog constants and validation (categories, subcategories, events).

pub const TAG_TECHNICAL: &str = "technical";
pub const TAG_NON_TECHNICAL: &str = "non-technical";

/// All valid event category tags.
pub const VALID_TAGS: &[&str] = &[TAG_TECHNICAL, TAG_NON_TECHNICAL];

/// Participant cap applied when an event is created without one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 100;

/// Default and maximum page sizes for catalog listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Validate that a category tag is one of the accepted values.
pub fn validate_tag(tag: &str) -> Result<(), String> {
    if VALID_TAGS.contains(&tag) {
        Ok(())
    } else {
        Err(format!(
            "Invalid category tag '{tag}'. Must be one of: {}",
            VALID_TAGS.join(", ")
        ))
    }
}

/// Validate a participant cap.
pub fn validate_max_participants(cap: i32) -> Result<(), String> {
    if cap >= 1 {
        Ok(())
    } else {
        Err(format!("max_participants must be at least 1, got {cap}"))
    }
}

/// Validate a display name (category, subcategory or event title).
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

/// Next sequence id within an event list: max existing + 1, starting at 1.
pub fn next_seq_id(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |max| max + 1)
}

/// Normalise `?page=&limit=` into a 1-based page and a bounded limit.
pub fn clamp_page(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

/// Row offset of a clamped page. Saturates, so a page far past the end
/// yields an empty slice instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}
