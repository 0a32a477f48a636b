use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Default lifetime of a cached catalog page.
const DEFAULT_EVENT_LIST_CACHE_TTL_SECS: u64 = 300;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// Mail domain of the host institution, used to word eligibility
    /// rejections. Empty disables the distinction.
    pub institution_email_domain: String,
    /// Lifetime of a cached catalog page.
    pub event_list_cache_ttl: Duration,
    /// Redis for the event list cache; `None` keeps the cache in process.
    pub redis_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                    |
    /// |------------------------------|----------------------------|
    /// | `HOST`                       | `0.0.0.0`                  |
    /// | `PORT`                       | `3000`                     |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                       |
    /// | `INSTITUTION_EMAIL_DOMAIN`   | empty                      |
    /// | `EVENT_LIST_CACHE_TTL_SECS`  | `300`                      |
    /// | `REDIS_URL`                  | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let institution_email_domain =
            std::env::var("INSTITUTION_EMAIL_DOMAIN").unwrap_or_default();

        let event_list_cache_ttl_secs: u64 = std::env::var("EVENT_LIST_CACHE_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_EVENT_LIST_CACHE_TTL_SECS.to_string())
            .parse()
            .expect("EVENT_LIST_CACHE_TTL_SECS must be a valid u64");

        let redis_url = std::env::var("REDIS_URL").ok().filter(|u| !u.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            institution_email_domain,
            event_list_cache_ttl: Duration::from_secs(event_list_cache_ttl_secs),
            redis_url,
        }
    }
}
