/// User model and database operations
///
/// A user row carries the profile fields, the Argon2id password hash, the
/// live session-token set (a `TEXT[]` on the row itself), and the optional
/// avatar blob.
///
/// Two rules are enforced here rather than in route handlers:
///
/// - Plaintext passwords cross into this module only inside [`CreateUser`]
///   and [`UpdateUser`]; `create` and `update` hash them exactly once,
///   inside the same call that performs the INSERT/UPDATE. A password that
///   was not touched is not re-hashed, so plaintext never reaches the
///   database and a stored hash is never hashed again.
/// - Deleting a user is a compound operation: one transaction removes every
///   task owned by the user and then the user row. If the cascade fails,
///   nothing is removed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     tokens TEXT[] NOT NULL DEFAULT '{}',
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{hash_password, PasswordError};

/// Error type for user persistence operations
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// Hashing a plaintext password failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database operation failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// User model
///
/// Serializing a `User` produces the public profile only: the password hash,
/// the token set, and the avatar blob are skipped.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name (non-empty, trimmed)
    pub name: String,

    /// Email address, unique across all users (CITEXT, stored lowercase)
    pub email: String,

    /// Age in years, non-negative
    pub age: i32,

    /// Argon2id password hash. Never plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Live session-token set, in issuance order
    #[serde(skip_serializing)]
    pub tokens: Vec<String>,

    /// Avatar image, re-encoded to 250x250 PNG at upload time
    #[serde(skip_serializing)]
    pub avatar: Option<Vec<u8>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// `password` is plaintext here; it is hashed inside [`User::create`] and
/// never stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Plaintext password (hashed before the INSERT)
    pub password: String,

    /// Age in years (defaults to 0)
    pub age: Option<i32>,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. A `Some` password is hashed inside
/// [`User::update`]; a `None` password leaves the stored hash untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New plaintext password
    pub password: Option<String>,

    /// New age
    pub age: Option<i32>,
}

impl User {
    /// Creates a new user
    ///
    /// Hashes the plaintext password and inserts the row in one operation.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails, the email is already taken
    /// (unique constraint), or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, UserStoreError> {
        let password_hash = hash_password(&data.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, age)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, age, password_hash, tokens, avatar,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(password_hash)
        .bind(data.age.unwrap_or(0))
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, age, password_hash, tokens, avatar,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, age, password_hash, tokens, avatar,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// Only `Some` fields are written; `updated_at` is always refreshed. If
    /// the password field was touched it is hashed here, inside the same
    /// call that issues the UPDATE, so the write that reaches the database
    /// carries the hash and nothing else.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails, the new email is already taken,
    /// or the database is unreachable.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, UserStoreError> {
        // plaintext -> hashed transition happens before any SQL is built
        let password_hash = match data.password {
            Some(ref plaintext) => Some(hash_password(plaintext)?),
            None => None,
        };

        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, email, age, password_hash, tokens, avatar, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(hash) = password_hash {
            q = q.bind(hash);
        }
        if let Some(age) = data.age {
            q = q.bind(age);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user and every task the user owns
    ///
    /// Runs as a single transaction: the task cascade must complete before
    /// the user row is removed, and a failure anywhere rolls the whole
    /// operation back. Returns the removed user, or `None` if the id did not
    /// exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, age, password_hash, tokens, avatar,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let removed = sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %id,
            cascaded_tasks = removed.rows_affected(),
            "Deleted user account"
        );

        Ok(Some(user))
    }

    /// Appends a token to the user's live-token set
    ///
    /// A single-statement `array_append`, so concurrent logins against the
    /// same user serialize on the row instead of racing a read-modify-write.
    pub async fn append_token(pool: &PgPool, id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_append(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes exactly the matching token from the live-token set
    ///
    /// No-op when the token is already absent.
    pub async fn remove_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_remove(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Clears the entire live-token set ("log out everywhere")
    pub async fn clear_tokens(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET tokens = '{}', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Stores the (already re-encoded) avatar PNG bytes
    pub async fn set_avatar(pool: &PgPool, id: Uuid, png: &[u8]) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET avatar = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(png)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Clears the stored avatar
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET avatar = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Fetches only the avatar bytes for a user
    ///
    /// `None` when the user does not exist or has no avatar; callers treat
    /// both the same way.
    pub async fn find_avatar(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let avatar: Option<Option<Vec<u8>>> =
            sqlx::query_scalar("SELECT avatar FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(avatar.flatten())
    }
}
