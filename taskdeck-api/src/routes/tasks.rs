/// Task endpoints: per-user CRUD with filtering, pagination, and sorting
///
/// Every handler operates strictly within the authenticated caller's task
/// set. Reads, updates, and deletes against someone else's task answer 404,
/// identical to a task that never existed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use taskdeck_shared::models::task::{CreateTask, Sort, Task, TaskFilter, UpdateTask};

use crate::{
    app::{AppState, AuthSession},
    error::{ApiError, ApiResult},
    routes::parse_body,
};

/// Fields a client may send when creating a task
const CREATE_FIELDS: &[&str] = &["description", "completed"];

/// Fields a client may PATCH on a task
const UPDATE_FIELDS: &[&str] = &["description", "completed"];

/// Query parameters for `GET /tasks`
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Only tasks with this completion state
    pub completed: Option<bool>,

    /// Page size
    pub limit: Option<i64>,

    /// Offset into the result set
    pub skip: Option<i64>,

    /// `<field>_<asc|desc>`, e.g. `createdAt_desc`
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl ListTasksQuery {
    /// Validates the raw query and produces a store-level filter
    fn into_filter(self) -> Result<TaskFilter, ApiError> {
        if self.limit.is_some_and(|l| l < 0) {
            return Err(ApiError::invalid_field(
                "limit",
                "limit must be a non-negative number",
            ));
        }
        if self.skip.is_some_and(|s| s < 0) {
            return Err(ApiError::invalid_field(
                "skip",
                "skip must be a non-negative number",
            ));
        }

        let sort = self
            .sort_by
            .map(|s| s.parse::<Sort>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(TaskFilter {
            completed: self.completed,
            limit: self.limit,
            skip: self.skip,
            sort,
        })
    }
}

/// Parses a path id; a malformed value gets the same 404 as a missing task
fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Task not found".to_string()))
}

/// `POST /tasks` — create a task owned by the caller
///
/// Requires a non-empty description after trimming. Responds 201 with the
/// stored task.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut req: CreateTask = parse_body(body, CREATE_FIELDS)?;

    req.description = req.description.trim().to_string();
    if req.description.is_empty() {
        return Err(ApiError::invalid_field(
            "description",
            "Description must not be empty",
        ));
    }

    let task = Task::create(&state.db, session.user.id, req).await?;

    tracing::debug!(task_id = %task.id, owner = %task.owner, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks` — list the caller's tasks
///
/// Supports `completed=true|false`, `limit`, `skip`, and
/// `sortBy=<field>_<asc|desc>`. An unrecognized sort field or direction is
/// a 400, never forwarded to the database.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = query.into_filter()?;
    let tasks = Task::list_for_owner(&state.db, session.user.id, filter).await?;

    Ok(Json(tasks))
}

/// `GET /tasks/:id` — fetch one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = Task::find_for_owner(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// `PATCH /tasks/:id` — partial update of one of the caller's tasks
///
/// Only `description` and `completed` may change; any other field rejects
/// the whole request with 400 before anything is written.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let mut req: UpdateTask = parse_body(body, UPDATE_FIELDS)?;

    if let Some(description) = req.description {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(ApiError::invalid_field(
                "description",
                "Description must not be empty",
            ));
        }
        req.description = Some(description);
    }

    let task = Task::update_for_owner(&state.db, id, session.user.id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// `DELETE /tasks/:id` — delete one of the caller's tasks
///
/// Responds with the removed task.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = Task::delete_for_owner(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(task_id = %task.id, owner = %task.owner, "Task deleted");
    Ok(Json(task))
}
