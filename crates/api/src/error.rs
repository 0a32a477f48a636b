use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventhub_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `eventhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to an HTTP status, error code, and message.
///
/// Every rejection keeps its specific message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::AlreadyRegistered => (StatusCode::BAD_REQUEST, "ALREADY_REGISTERED", message),
        CoreError::NotRegistered => (StatusCode::BAD_REQUEST, "NOT_REGISTERED", message),
        CoreError::CapacityExceeded { .. } => {
            (StatusCode::BAD_REQUEST, "CAPACITY_EXCEEDED", message)
        }
        CoreError::ScheduleConflict { .. } => {
            (StatusCode::BAD_REQUEST, "SCHEDULE_CONFLICT", message)
        }
        CoreError::MissingDate => (StatusCode::BAD_REQUEST, "MISSING_DATE", message),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::NotEligible(msg) => (StatusCode::FORBIDDEN, "NOT_ELIGIBLE", msg.clone()),
        CoreError::AlreadySubmitted => (StatusCode::CONFLICT, "ALREADY_SUBMITTED", message),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    if constraint.starts_with("uq_") {
                        return (
                            StatusCode::CONFLICT,
                            "CONFLICT",
                            format!("Duplicate value violates unique constraint: {constraint}"),
                        );
                    }
                }
                // foreign_key_violation
                Some("23503") => {
                    return (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Referenced record does not exist".to_string(),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CoreError) -> StatusCode {
        AppError::Core(err).into_response().status()
    }

    #[test]
    fn business_rule_failures_are_bad_requests() {
        assert_eq!(status_of(CoreError::AlreadyRegistered), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::NotRegistered), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::CapacityExceeded { cap: 2 }), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::MissingDate), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CoreError::ScheduleConflict {
                title: "Quiz".into(),
                date: "2025-01-01".into(),
                start_time: "10:00".into(),
                end_time: "11:00".into(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn eligibility_and_scope_failures_are_forbidden() {
        assert_eq!(status_of(CoreError::NotEligible("pending".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(CoreError::Forbidden("scope".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn locked_attendance_is_a_conflict() {
        assert_eq!(status_of(CoreError::AlreadySubmitted), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_and_unauthorized() {
        assert_eq!(
            status_of(CoreError::NotFound { entity: "Event", id: 3 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(CoreError::Unauthorized("no token".into())), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let (status, code, _) = classify_sqlx_error(&sqlx::Error::RowNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }
}
