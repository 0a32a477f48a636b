#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{NaiveDate, NaiveTime};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use eventhub_api::auth::jwt::{generate_access_token, JwtConfig};
use eventhub_api::cache::{EventListCache, InMemoryEventListCache};
use eventhub_api::config::ServerConfig;
use eventhub_api::router::build_app_router;
use eventhub_api::state::AppState;
use eventhub_core::registration::{PAYMENT_APPROVED, PAYMENT_PENDING};
use eventhub_core::roles::{ROLE_ADMIN, ROLE_MANAGER, ROLE_STUDENT};
use eventhub_db::models::catalog::{Category, CreateCategory, CreateEvent, Event};
use eventhub_db::models::user::{CreateUser, User};
use eventhub_db::repositories::{CategoryRepo, EventRepo, UserRepo};

pub const INSTITUTION_DOMAIN: &str = "college.edu";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
        institution_email_domain: INSTITUTION_DOMAIN.to_string(),
        event_list_cache_ttl: Duration::from_secs(300),
        redis_url: None,
    }
}

/// Build the full application router over `pool` with an in-process cache.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_cache(pool, Arc::new(InMemoryEventListCache::new()))
}

/// Like [`build_test_app`] but sharing `cache` with the caller.
pub fn build_test_app_with_cache(pool: PgPool, cache: Arc<dyn EventListCache>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_cache: cache,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

async fn create_user(pool: &PgPool, name: &str, role: &str, approved: bool) -> User {
    let slug = name.to_lowercase().replace(' ', ".");
    UserRepo::create(
        pool,
        &CreateUser {
            email: format!("{slug}@gmail.com"),
            full_name: name.to_string(),
            college: "City College".to_string(),
            college_id: format!("CC-{slug}"),
            role: role.to_string(),
            is_approved: approved,
            payment_status: if approved {
                PAYMENT_APPROVED.to_string()
            } else {
                PAYMENT_PENDING.to_string()
            },
        },
    )
    .await
    .unwrap()
}

/// An approved, paid participant.
pub async fn participant(pool: &PgPool, name: &str) -> User {
    create_user(pool, name, ROLE_STUDENT, true).await
}

pub async fn unapproved_participant(pool: &PgPool, name: &str, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: name.to_string(),
            college: "City College".to_string(),
            college_id: "CC-0".to_string(),
            role: ROLE_STUDENT.to_string(),
            is_approved: false,
            payment_status: PAYMENT_PENDING.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn admin(pool: &PgPool) -> User {
    create_user(pool, "Ada Admin", ROLE_ADMIN, true).await
}

pub async fn manager(pool: &PgPool, name: &str) -> User {
    create_user(pool, name, ROLE_MANAGER, true).await
}

pub async fn category(pool: &PgPool, name: &str) -> Category {
    CategoryRepo::create(pool, &CreateCategory { name: name.to_string() })
        .await
        .unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

/// A direct event of `category` on `day` from `start` to `end`.
pub async fn event(
    pool: &PgPool,
    category: &Category,
    title: &str,
    day: &str,
    start: &str,
    end: &str,
    cap: i32,
) -> Event {
    EventRepo::create(
        pool,
        category.id,
        &CreateEvent {
            subcategory_id: None,
            title: title.to_string(),
            description: None,
            venue: Some("Main Hall".to_string()),
            event_date: date(day),
            start_time: time(start),
            end_time: time(end),
            max_participants: Some(cap),
            category_tag: None,
        },
    )
    .await
    .unwrap()
}

/// JSON reference to a direct event of a category.
pub fn event_ref(event: &Event) -> serde_json::Value {
    serde_json::json!({
        "category_id": event.category_id,
        "subcategory_id": event.subcategory_id,
        "event_id": event.seq_id,
    })
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
