//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` entity structs matching database rows
//! - `Deserialize` request DTOs for inserts and patches

pub mod attendance;
pub mod catalog;
pub mod email_job;
pub mod manager_assignment;
pub mod registration;
pub mod user;
