//! User and API token repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row, SqlitePool};

use super::{is_unique_violation, DbError};
use crate::auth::{generate_token, hash_password, verify_password};
use crate::models::{Email, Registration, ValidationError};

/// User record from database. The password hash never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// API token record. One per user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a validated registration. A taken username is reported as a
    /// `username` field error.
    pub async fn register(&self, registration: &Registration) -> Result<User, DbError> {
        let password_hash = hash_password(registration.password.expose())?;
        let email = registration
            .email
            .as_ref()
            .map(Email::as_str)
            .unwrap_or_default();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, date_joined)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, date_joined
            "#,
        )
        .bind(registration.username.as_str())
        .bind(email)
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Invalid(ValidationError::Duplicate {
                    resource: "user",
                    field: "username",
                })
            } else {
                DbError::from(e)
            }
        })?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials. `None` when the username is unknown or the
    /// password is wrong; callers cannot tell which.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query(
            "SELECT id, username, email, date_joined, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            tracing::debug!(username, "login for unknown user");
            return Ok(None);
        };

        let hash: String = row.get("password_hash");
        if !verify_password(password, &hash)? {
            tracing::debug!(username, "login with wrong password");
            return Ok(None);
        }

        Ok(Some(User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            date_joined: row.get("date_joined"),
        }))
    }

    /// Return the user's token, issuing one on first call.
    ///
    /// Concurrent first calls race on `auth_tokens.user_id`; the loser's
    /// insert is ignored and both read back the winning row.
    pub async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, DbError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id, created)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(generate_token())
        .bind(user_id)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            tracing::info!(user_id, "token issued");
        }

        sqlx::query_as::<_, AuthToken>(
            "SELECT key, user_id, created FROM auth_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", user_id))
    }

    /// Delete the user's token. Returns whether one existed.
    pub async fn revoke(&self, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn user_for_token(&self, key: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.date_joined
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_email(&self, user_id: i64, email: &Email) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET email = ? WHERE id = ? RETURNING id, username, email, date_joined",
        )
        .bind(email.as_str())
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", user_id))
    }
}
