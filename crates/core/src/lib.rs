//! Domain rules for event registration, attendance and certificates.
//!
//! This crate has zero internal dependencies so the API, repository and
//! worker layers can all share the same validation and decision logic.

pub mod attendance;
pub mod catalog;
pub mod error;
pub mod registration;
pub mod roles;
pub mod schedule;
pub mod types;
