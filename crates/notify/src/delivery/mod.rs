//! External delivery collaborators for certificate notifications.

pub mod email;
pub mod renderer;
