//! Access-token handling. Tokens are issued by the external identity
//! service; this server only verifies them.

pub mod jwt;
