/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; domain errors are explicit
/// result values converted at this boundary, never exceptions intercepted
/// mid-flight.
///
/// # Taxonomy
///
/// - 400 `BadRequest`: DTO validation failures and illegal status
///   transitions, carrying an array of human-readable messages
/// - 401 `Unauthorized`: missing, malformed, or expired token; bad login
/// - 403 `Forbidden`: authenticated but not the owner / missing role
/// - 404 `NotFound`: no such task or user
/// - 409 `Conflict`: duplicate email
/// - 500 `InternalError`: logged, masked from clients

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskhub_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use taskhub_shared::models::task::TransitionError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - validation failures and illegal transitions
    BadRequest(Vec<String>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
///
/// `message` is always an array; 400 responses may carry several entries
/// (one per failed field), the rest carry one.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error messages
    pub message: Vec<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msgs) => write!(f, "Bad request: {}", msgs.join("; ")),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msgs) => (StatusCode::BAD_REQUEST, "bad_request", msgs),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", vec![msg]),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", vec![msg]),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", vec![msg]),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", vec![msg]),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    vec!["An internal error occurred".to_string()],
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations surface as conflicts
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert bearer-auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::Unauthorized(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert status-machine errors to API errors
impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::BadRequest(vec![err.to_string()])
    }
}

/// Collects validator errors into a 400 message array
///
/// Each entry is `field: message` so clients can attribute failures.
pub fn validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let detail = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string());
                format!("{}: {}", field, detail)
            })
        })
        .collect();

    ApiError::BadRequest(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_shared::models::task::TaskStatus;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest(vec!["Invalid input".to_string()]);
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (
                ApiError::BadRequest(vec!["x".to_string()]),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("x".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".to_string()), StatusCode::CONFLICT),
            (
                ApiError::InternalError("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_transition_error_maps_to_400_with_message_array() {
        let err: ApiError = TransitionError {
            from: TaskStatus::Open,
            to: TaskStatus::Done,
        }
        .into();

        match err {
            ApiError::BadRequest(msgs) => {
                assert_eq!(msgs, vec!["cannot move task from OPEN to DONE".to_string()]);
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_authz_error_maps_to_forbidden() {
        let err: ApiError = AuthzError::NotOwner.into();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
