//! User table operations

use sqlx::{FromRow, SqlitePool};

use super::map_write_error;
use crate::db::store::{new_id, StoreError, StoreResult};
use crate::models::{NewUser, User, UserRole};

/// Database row for user table
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    username: String,
    password: String,
    role: String,
}

impl UserRow {
    fn into_user(self) -> User {
        let role = UserRole::parse(&self.role).unwrap_or_else(|| {
            tracing::warn!(user_id = %self.id, role = %self.role, "Unknown role stored for user");
            UserRole::User
        });

        User {
            id: self.id,
            email: self.email,
            username: self.username,
            password: self.password,
            role,
        }
    }
}

/// User table operations
pub struct UserTable;

impl UserTable {
    /// Insert a user, assigning a fresh id
    pub async fn insert(pool: &SqlitePool, user: NewUser) -> StoreResult<User> {
        let id = new_id();

        sqlx::query(
            "INSERT INTO user (id, email, username, password, role) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.as_str())
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, format!("email {} already registered", user.email)))?;

        Ok(User {
            id,
            email: user.email,
            username: user.username,
            password: user.password,
            role: user.role,
        })
    }

    /// Get user by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| r.into_user())
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    /// Get user by email
    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        row.map(|r| r.into_user())
            .ok_or_else(|| StoreError::not_found("user", email))
    }
}
