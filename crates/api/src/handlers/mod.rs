//! Request handlers.
//!
//! Handlers extract the caller and input, delegate to an engine in
//! [`crate::engine`] or a repository in `eventhub_db`, and wrap results in
//! the `{ "data": ... }` envelope. Errors map via [`crate::error::AppError`].

pub mod attendance;
pub mod catalog;
pub mod manager_assignment;
pub mod registration;
