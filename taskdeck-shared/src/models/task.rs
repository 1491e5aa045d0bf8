/// Task model and database operations
///
/// Tasks are plain CRUD records owned by exactly one user. Every query here
/// is scoped by owner: a task that exists but belongs to someone else is
/// indistinguishable from one that does not exist, so handlers can answer
/// 404 for both without leaking ownership.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

/// Task model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing (non-empty, trimmed)
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// The user this task belongs to
    pub owner: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    /// Task description
    pub description: String,

    /// Initial completion state (defaults to false)
    pub completed: Option<bool>,
}

/// Input for updating an existing task; only `Some` fields are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    /// New description
    pub description: Option<String>,

    /// New completion state
    pub completed: Option<bool>,
}

/// Column a task listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl SortField {
    /// Column name used in ORDER BY. Fixed set, never caller-supplied text.
    fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Description => "description",
            SortField::Completed => "completed",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Error for an unrecognized `sortBy` value
#[derive(Debug, thiserror::Error)]
#[error("Unknown sort specification: {0}")]
pub struct SortParseError(String);

/// A parsed `sortBy` query value, e.g. `createdAt_desc`
///
/// The wire format is `<field>_<asc|desc>`; fields are accepted in both
/// camelCase and snake_case. Anything outside the whitelist is an error
/// rather than being forwarded to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Asc,
        }
    }
}

impl FromStr for Sort {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .rsplit_once('_')
            .ok_or_else(|| SortParseError(s.to_string()))?;

        let field = match field {
            "createdAt" | "created_at" => SortField::CreatedAt,
            "updatedAt" | "updated_at" => SortField::UpdatedAt,
            "description" => SortField::Description,
            "completed" => SortField::Completed,
            _ => return Err(SortParseError(s.to_string())),
        };

        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(SortParseError(s.to_string())),
        };

        Ok(Sort { field, direction })
    }
}

/// Filter and pagination options for listing a user's tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks with this completion state (None = all)
    pub completed: Option<bool>,

    /// Maximum number of tasks to return (None = unbounded)
    pub limit: Option<i64>,

    /// Number of tasks to skip
    pub skip: Option<i64>,

    /// Sort order (defaults to created_at ascending)
    pub sort: Option<Sort>,
}

impl Task {
    /// Creates a task owned by `owner`
    pub async fn create(
        pool: &PgPool,
        owner: Uuid,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (description, completed, owner)
            VALUES ($1, $2, $3)
            RETURNING id, description, completed, owner, created_at, updated_at
            "#,
        )
        .bind(data.description)
        .bind(data.completed.unwrap_or(false))
        .bind(owner)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by id, visible only to its owner
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, description, completed, owner, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks for an owner with filtering, pagination, and sorting
    ///
    /// The ORDER BY clause is built from the [`Sort`] whitelist; completed
    /// filter, limit, and skip are bound parameters (`NULL` disables the
    /// filter or the limit).
    pub async fn list_for_owner(
        pool: &PgPool,
        owner: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sort = filter.sort.unwrap_or_default();

        let query = format!(
            r#"
            SELECT id, description, completed, owner, created_at, updated_at
            FROM tasks
            WHERE owner = $1 AND ($2::boolean IS NULL OR completed = $2)
            ORDER BY {} {}
            LIMIT $3 OFFSET $4
            "#,
            sort.field.column(),
            sort.direction.keyword(),
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(owner)
            .bind(filter.completed)
            .bind(filter.limit)
            .bind(filter.skip.unwrap_or(0))
            .fetch_all(pool)
            .await
    }

    /// Updates a task, visible only to its owner
    ///
    /// Returns `None` when no task with this id belongs to `owner` — same
    /// answer whether the task is missing or someone else's.
    pub async fn update_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND owner = $2 \
             RETURNING id, description, completed, owner, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task, visible only to its owner; returns the removed task
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner = $2
            RETURNING id, description, completed, owner, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Counts tasks owned by a user
    pub async fn count_for_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE owner = $1")
            .bind(owner)
            .fetch_one(pool)
            .await
    }
}
