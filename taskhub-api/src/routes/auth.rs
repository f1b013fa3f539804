/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Profile lookup
/// - An admin-gated endpoint
///
/// # Endpoints
///
/// - `POST /auth/register` - Register new user (public)
/// - `POST /auth/login` - Login and get an access token (public)
/// - `GET /auth/profile` - Caller's own record (bearer token)
/// - `GET /auth/admin` - Admin role required (bearer token + ADMIN)

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{authorization::require_admin, jwt, middleware::Principal, password},
    models::user::{CreateUser, Role, User},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Accepted but discarded: every account starts with exactly `[USER]`,
    /// whatever the client asked for
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed access token
    pub access_token: String,
}

/// User record as exposed over the API
///
/// The password hash never appears here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Granted roles
    pub roles: Vec<Role>,

    /// Created at
    pub created_at: DateTime<Utc>,

    /// Updated at
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin endpoint response
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    /// Greeting for the privileged few
    pub message: String,
}

/// Register a new user
///
/// Creates a user with the default role set `[USER]`. A `roles` field in
/// the payload is silently discarded.
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "Password123!",
///   "name": "John Doe"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate().map_err(validation_errors)?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::BadRequest(vec![format!("password: {}", e)]))?;

    let password_hash = password::hash_password(&req.password)?;

    // req.roles is intentionally unused: role grants never come from the
    // registration payload.
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login endpoint
///
/// Authenticates a user and returns a signed access token embedding the
/// user id and role set. The same error is returned for an unknown email
/// and a wrong password, so callers cannot probe which emails exist.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "Password123!"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "accessToken": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    req.validate().map_err(validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = jwt::Claims::with_expiry(user.id, user.roles, state.token_expiry());
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok((StatusCode::CREATED, Json(LoginResponse { access_token })))
}

/// Returns the caller's own user record
///
/// # Endpoint
///
/// ```text
/// GET /auth/profile
/// Authorization: Bearer <token>
/// ```
pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Admin-gated endpoint
///
/// # Endpoint
///
/// ```text
/// GET /auth/admin
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller lacks the ADMIN role
pub async fn admin_only(
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<AdminResponse>> {
    require_admin(&principal)?;

    Ok(Json(AdminResponse {
        message: "This is for admins only!".to_string(),
    }))
}
