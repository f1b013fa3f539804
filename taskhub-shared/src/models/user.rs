/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing
/// user accounts. Each user carries an ordered set of roles; the `User`
/// role is always present and is granted at creation regardless of what a
/// registration payload asked for. The `Admin` role is only ever granted
/// out-of-band.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     roles user_role[] NOT NULL DEFAULT '{user}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::user::{User, CreateUser};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "John Doe".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role granted to a user
///
/// Serialized as `USER` / `ADMIN` on the wire and stored as the lowercase
/// `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Default role, present on every account
    User,

    /// Grants access to administrative endpoints
    Admin,
}

impl sqlx::postgres::PgHasArrayType for Role {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_user_role")
    }
}

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The
/// password hash must never be serialized into an API response; handlers
/// convert to a response DTO that omits it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Roles granted to this user; always contains [`Role::User`]
    pub roles: Vec<Role>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checks whether this user holds the given role
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Input for creating a new user
///
/// There is deliberately no `roles` field here: the role set at creation is
/// always exactly `[User]`, whatever the registration payload contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Display name
    pub name: String,
}

impl User {
    /// Creates a new user with the default role set `[User]`
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, roles, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(vec![Role::User])
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, roles, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, roles, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Replaces a user's role set
    ///
    /// Role changes are not exposed through the API; this exists for
    /// operational tooling and tests (e.g. granting `Admin`).
    pub async fn set_roles(
        pool: &PgPool,
        id: Uuid,
        roles: Vec<Role>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET roles = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, name, roles, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(roles)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");

        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_create_user_has_no_roles_field() {
        // CreateUser deliberately carries no role set; a registration
        // payload claiming ADMIN never reaches the insert.
        let create = CreateUser {
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Test User".to_string(),
        };

        let json = serde_json::to_value(&create).unwrap();
        assert!(json.get("roles").is_none());
    }

    #[test]
    fn test_has_role() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "A".to_string(),
            roles: vec![Role::User],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(user.has_role(Role::User));
        assert!(!user.has_role(Role::Admin));
    }
}
