/// Task endpoints
///
/// Owner-scoped task CRUD plus label management. Every task-scoped handler
/// follows the same sequence: resolve existence (404 for a missing id),
/// then check ownership (403 for someone else's task), then act. Listing
/// skips the ownership check because the query itself is scoped to the
/// caller.
///
/// # Endpoints
///
/// - `GET /tasks` - List the caller's tasks with filters and pagination
/// - `POST /tasks` - Create a task owned by the caller
/// - `GET /tasks/:id` - Fetch one task
/// - `PATCH /tasks/:id` - Update fields; status moves are validated
/// - `DELETE /tasks/:id` - Delete a task and its labels
/// - `POST /tasks/:id/labels` - Attach labels
/// - `DELETE /tasks/:id/labels` - Detach labels by name

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskhub_shared::{
    auth::{authorization::authorize_task_access, middleware::Principal},
    models::{
        label::TaskLabel,
        task::{CreateTask, Task, TaskFilters, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Default page size when the client doesn't ask for one
const DEFAULT_LIMIT: i64 = 10;

/// Hard ceiling on page size
const MAX_LIMIT: i64 = 100;

/// Label supplied at creation or attach time
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLabelRequest {
    /// Label name
    #[validate(length(min = 1, max = 100, message = "Label name must be 1-100 characters"))]
    pub name: String,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Task description
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// Initial status
    pub status: TaskStatus,

    /// Labels to attach together with the task
    #[serde(default)]
    pub labels: Option<Vec<CreateLabelRequest>>,
}

/// Update task request
///
/// Only present fields are changed; at least one must be present.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    /// Requested status move
    pub status: Option<TaskStatus>,
}

impl UpdateTaskRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Listing query parameters: filters plus pagination
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring match against title or description
    pub search: Option<String>,

    /// Page size (default 10, max 100)
    pub limit: Option<i64>,

    /// Page start (default 0)
    pub offset: Option<i64>,
}

/// Label as exposed over the API
#[derive(Debug, Serialize)]
pub struct LabelResponse {
    /// Label ID
    pub id: Uuid,

    /// Label name
    pub name: String,
}

impl From<TaskLabel> for LabelResponse {
    fn from(label: TaskLabel) -> Self {
        Self {
            id: label.id,
            name: label.name,
        }
    }
}

/// Task as exposed over the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Attached labels
    pub labels: Vec<LabelResponse>,

    /// Created at
    pub created_at: DateTime<Utc>,

    /// Updated at
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    fn new(task: Task, labels: Vec<TaskLabel>) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            status: task.status,
            labels: labels.into_iter().map(LabelResponse::from).collect(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Pagination metadata for a listing
#[derive(Debug, Serialize)]
pub struct PageMeta {
    /// Total count of the full filtered set, not just this page
    pub total: i64,

    /// Page start
    pub offset: i64,

    /// Page size
    pub limit: i64,
}

/// Listing envelope
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Tasks on this page
    pub data: Vec<TaskResponse>,

    /// Pagination metadata
    pub meta: PageMeta,
}

/// Clamps a requested page size into [1, MAX_LIMIT]
fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamps a requested offset to be non-negative
fn clamp_offset(requested: Option<i64>) -> i64 {
    requested.unwrap_or(0).max(0)
}

/// De-duplicates label names, preserving first-seen order
fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Resolves a task and checks the caller owns it
///
/// Existence first: a missing id is 404 before ownership is evaluated, so
/// a caller probing foreign ids cannot tell "not found" from "not yours"
/// by the order of checks alone.
async fn find_owned_task(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    authorize_task_access(principal, &task)?;

    Ok(task)
}

/// List the caller's tasks
///
/// The owner scope is applied in the SQL query; tasks of other users are
/// never fetched, let alone filtered out in memory. `meta.total` counts
/// the full filtered set independent of the pagination window.
///
/// # Endpoint
///
/// ```text
/// GET /tasks?status=OPEN&search=report&limit=10&offset=0
/// Authorization: Bearer <token>
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let limit = clamp_limit(query.limit);
    let offset = clamp_offset(query.offset);

    let filters = TaskFilters {
        status: query.status,
        search: query.search,
    };

    let tasks = Task::list_by_owner(&state.db, principal.id, &filters, limit, offset).await?;
    let total = Task::count_by_owner(&state.db, principal.id, &filters).await?;

    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let mut labels_by_task: HashMap<Uuid, Vec<TaskLabel>> = HashMap::new();
    for label in TaskLabel::list_by_tasks(&state.db, &task_ids).await? {
        labels_by_task.entry(label.task_id).or_default().push(label);
    }

    let data = tasks
        .into_iter()
        .map(|task| {
            let labels = labels_by_task.remove(&task.id).unwrap_or_default();
            TaskResponse::new(task, labels)
        })
        .collect();

    Ok(Json(ListTasksResponse {
        data,
        meta: PageMeta {
            total,
            offset,
            limit,
        },
    }))
}

/// Fetch one task
///
/// # Endpoint
///
/// ```text
/// GET /tasks/:id
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Task exists but belongs to someone else
/// - `404 Not Found`: No such task
pub async fn find_one_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = find_owned_task(&state, &principal, id).await?;
    let labels = TaskLabel::list_by_task(&state.db, task.id).await?;

    Ok(Json(TaskResponse::new(task, labels)))
}

/// Create a task
///
/// The owner is forced to the caller's id; any owner hint in the payload
/// has no field to land in. Labels supplied here are attached in the same
/// transaction as the task insert.
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers",
///   "status": "OPEN",
///   "labels": [{ "name": "work" }]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate().map_err(validation_errors)?;
    for label in req.labels.iter().flatten() {
        label.validate().map_err(validation_errors)?;
    }

    let label_names = dedupe_names(
        req.labels
            .unwrap_or_default()
            .into_iter()
            .map(|l| l.name)
            .collect(),
    );

    let (task, labels) = Task::create_with_labels(
        &state.db,
        CreateTask {
            user_id: principal.id,
            title: req.title,
            description: req.description,
            status: req.status,
        },
        &label_names,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::new(task, labels))))
}

/// Update a task
///
/// When the patch carries a status, the move is validated against the
/// transition table before anything is written; an illegal move rejects
/// the whole patch, title and description included.
///
/// # Endpoint
///
/// ```text
/// PATCH /tasks/:id
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "status": "IN_PROGRESS" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or illegal status move
/// - `403 Forbidden`: Not the owner
/// - `404 Not Found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate().map_err(validation_errors)?;

    if req.is_empty() {
        return Err(ApiError::BadRequest(vec![
            "At least one field must be provided".to_string(),
        ]));
    }

    let task = find_owned_task(&state, &principal, id).await?;

    let patched = task.apply_patch(&UpdateTask {
        title: req.title,
        description: req.description,
        status: req.status,
    })?;

    let task = Task::save_patch(&state.db, &patched)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let labels = TaskLabel::list_by_task(&state.db, task.id).await?;

    Ok(Json(TaskResponse::new(task, labels)))
}

/// Delete a task
///
/// Labels go with it (cascade).
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Not the owner
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = find_owned_task(&state, &principal, id).await?;

    Task::delete(&state.db, task.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Attach labels to a task
///
/// Names already present on the task (or repeated in the payload) are
/// de-duplicated rather than rejected.
///
/// # Endpoint
///
/// ```text
/// POST /tasks/:id/labels
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// [{ "name": "urgent" }, { "name": "work" }]
/// ```
pub async fn add_labels(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<Vec<CreateLabelRequest>>,
) -> ApiResult<Json<TaskResponse>> {
    for label in &req {
        label.validate().map_err(validation_errors)?;
    }

    let task = find_owned_task(&state, &principal, id).await?;

    let names = dedupe_names(req.into_iter().map(|l| l.name).collect());
    let labels = TaskLabel::attach(&state.db, task.id, &names).await?;

    Ok(Json(TaskResponse::new(task, labels)))
}

/// Detach labels from a task by name
///
/// Names not present on the task are ignored; the call still succeeds.
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id/labels
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// ["urgent", "work"]
/// ```
pub async fn remove_labels(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(names): Json<Vec<String>>,
) -> ApiResult<StatusCode> {
    let task = find_owned_task(&state, &principal, id).await?;

    TaskLabel::detach(&state.db, task.id, &names).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIMIT);
    }

    #[test]
    fn test_clamp_offset() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(30)), 30);
        assert_eq!(clamp_offset(Some(-1)), 0);
    }

    #[test]
    fn test_dedupe_names_preserves_order() {
        let names = vec![
            "work".to_string(),
            "urgent".to_string(),
            "work".to_string(),
        ];

        assert_eq!(
            dedupe_names(names),
            vec!["work".to_string(), "urgent".to_string()]
        );
    }

    #[test]
    fn test_update_request_emptiness() {
        let empty: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());

        let with_status: UpdateTaskRequest =
            serde_json::from_str(r#"{"status": "DONE"}"#).unwrap();
        assert!(!with_status.is_empty());
    }

    #[test]
    fn test_create_request_requires_status() {
        let missing_status = serde_json::from_str::<CreateTaskRequest>(
            r#"{"title": "T", "description": "D"}"#,
        );
        assert!(missing_status.is_err());

        let ok = serde_json::from_str::<CreateTaskRequest>(
            r#"{"title": "T", "description": "D", "status": "OPEN"}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_list_query_parses_status() {
        let query: ListTasksQuery =
            serde_urlencoded::from_str("status=IN_PROGRESS&limit=5").unwrap();

        assert_eq!(query.status, Some(TaskStatus::InProgress));
        assert_eq!(query.limit, Some(5));
        assert!(query.search.is_none());
    }

    #[test]
    fn test_task_response_wire_format() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "T".to_string(),
            description: "D".to_string(),
            status: TaskStatus::InProgress,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(TaskResponse::new(task, vec![])).unwrap();

        assert_eq!(json["status"], "IN_PROGRESS");
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
