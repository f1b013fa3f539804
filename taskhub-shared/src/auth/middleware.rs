/// Bearer-token authentication for Axum
///
/// This module turns an `Authorization: Bearer <token>` header into a
/// [`Principal`] — the authenticated caller's id and role set, derived once
/// per request from a verified token and threaded into handlers through
/// request extensions. A `Principal` is never persisted; it lives only for
/// the duration of one request.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskhub_shared::auth::middleware::Principal;
///
/// async fn handler(Extension(principal): Extension<Principal>) -> String {
///     format!("Hello, user {}!", principal.id)
/// }
/// ```

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::Role;

/// The authenticated caller for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub id: Uuid,

    /// Roles carried by the verified token
    pub roles: Vec<Role>,
}

impl Principal {
    /// Creates a principal from verified JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            roles: claims.roles.clone(),
        }
    }

    /// Checks whether the caller holds the given role
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Error type for bearer-token authentication
///
/// Every variant surfaces as 401: a caller without a verifiable token is
/// unauthenticated whether the header is missing, malformed, or carries a
/// bad token.
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed (bad signature, expired, wrong issuer)
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) => msg,
            AuthError::InvalidToken(msg) => msg,
        };

        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

/// Extracts and verifies the bearer token from request headers
///
/// This is the single entry point the API's auth layer uses: it parses the
/// `Authorization` header, validates the token, and produces the request's
/// [`Principal`].
///
/// # Errors
///
/// - `MissingCredentials` if there is no Authorization header
/// - `InvalidFormat` if the header is not `Bearer <token>`
/// - `InvalidToken` if validation fails (signature, expiry, issuer)
pub fn principal_from_headers(headers: &HeaderMap, secret: &str) -> Result<Principal, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(Principal::from_claims(&claims))
}
