//! Request-path engines.
//!
//! - [`catalog`] resolves event references and serves the cached catalog
//!   listing.
//! - [`registration`] enrolls and withdraws participants under the
//!   capacity and schedule-conflict rules.
//! - [`attendance`] reads and submits attendance sheets and queues the
//!   resulting certificates.

pub mod attendance;
pub mod catalog;
pub mod registration;
