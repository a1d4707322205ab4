//! Thin HTTP boundary: routing, extraction, and status mapping.
//!
//! All semantics live in the handler modules; this layer only translates
//! between the wire and the handler signatures. The authenticated actor
//! arrives in the `x-taskhub-user` header, placed there by the auth proxy
//! in front of this service.

use std::collections::BTreeSet;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use taskhub_events::EventBus;
use taskhub_storage::{
    ListId, ListMetaPatch, Member, Patch, Priority, Role, SortField, SortOrder, Todo, TodoFilter,
    TodoId, TodoPatch, TodoQuery, TodoStatus, UserId, Visibility, DEFAULT_PAGE_LIMIT,
};

use crate::error::ApiError;
use crate::handlers::{lists, members, todos, ListView};
use crate::server::TaskhubServer;

pub const ACTOR_HEADER: &str = "x-taskhub-user";

/// The authenticated caller, extracted from the actor header.
pub struct Actor(pub UserId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::Validation(format!("missing {} header", ACTOR_HEADER)))?;
        let value = value
            .to_str()
            .map_err(|_| ApiError::Validation(format!("malformed {} header", ACTOR_HEADER)))?;
        let user_id = value
            .parse()
            .map_err(|_| ApiError::Validation(format!("malformed {} header", ACTOR_HEADER)))?;
        Ok(Actor(user_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::InvalidOperation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_operation"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        // Internal detail stays in the logs, not on the wire.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({ "error": kind, "message": message });
        (status, Json(body)).into_response()
    }
}

/// Deserialize a field so that absence, `null`, and a value are three
/// distinct states (`None`, `Some(None)`, `Some(Some(v))`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

fn patch_of<T>(field: Option<Option<T>>) -> Patch<T> {
    match field {
        None => Patch::Keep,
        Some(None) => Patch::Clear,
        Some(Some(value)) => Patch::Set(value),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateListBody {
    name: Option<String>,
    #[serde(deserialize_with = "double_option")]
    description: Option<Option<String>>,
    visibility: Option<Visibility>,
    #[serde(deserialize_with = "double_option")]
    color: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    icon: Option<Option<String>>,
}

impl From<UpdateListBody> for ListMetaPatch {
    fn from(body: UpdateListBody) -> Self {
        ListMetaPatch {
            name: body.name,
            description: patch_of(body.description),
            visibility: body.visibility,
            color: patch_of(body.color),
            icon: patch_of(body.icon),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateTodoBody {
    name: Option<String>,
    #[serde(deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    due_date: Option<Option<DateTime<Utc>>>,
    status: Option<TodoStatus>,
    #[serde(deserialize_with = "double_option")]
    priority: Option<Option<Priority>>,
    tags: Option<BTreeSet<String>>,
    assignee_id: Option<UserId>,
}

impl From<UpdateTodoBody> for TodoPatch {
    fn from(body: UpdateTodoBody) -> Self {
        TodoPatch {
            name: body.name,
            description: patch_of(body.description),
            due_date: patch_of(body.due_date),
            status: body.status,
            priority: patch_of(body.priority),
            tags: body.tags,
            assignee_id: body.assignee_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleBody {
    role: Role,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TodoQueryParams {
    list_id: Option<ListId>,
    status: Option<TodoStatus>,
    priority: Option<Priority>,
    /// Comma-separated tag names.
    tags: Option<String>,
    due_from: Option<DateTime<Utc>>,
    due_to: Option<DateTime<Utc>>,
    sort_field: Option<SortField>,
    sort_order: Option<SortOrder>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl TodoQueryParams {
    fn into_query(self) -> (Option<ListId>, TodoQuery) {
        let tags = self.tags.map(|raw| {
            raw.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        });
        let query = TodoQuery {
            filter: TodoFilter {
                status: self.status,
                priority: self.priority,
                tags,
                due_from: self.due_from,
                due_to: self.due_to,
            },
            sort_field: self.sort_field.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        };
        (self.list_id, query)
    }
}

#[derive(Debug, Serialize)]
struct TodoPageBody {
    items: Vec<Todo>,
    total: u64,
    page: u32,
    total_pages: u32,
}

pub fn router(server: TaskhubServer) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/v1/lists", post(create_list).get(list_lists))
        .route(
            "/v1/lists/:list_id",
            get(get_list).patch(update_list).delete(delete_list),
        )
        .route("/v1/lists/:list_id/archive", post(archive_list))
        .route("/v1/lists/:list_id/unarchive", post(unarchive_list))
        .route(
            "/v1/lists/:list_id/members",
            get(list_members).post(add_member),
        )
        .route(
            "/v1/lists/:list_id/members/:user_id",
            put(update_member_role).delete(remove_member),
        )
        .route("/v1/lists/:list_id/todos", post(create_todo))
        .route("/v1/lists/:list_id/events", get(list_events))
        .route("/v1/todos", get(query_todos))
        .route(
            "/v1/todos/:todo_id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(server)
}

async fn health() -> &'static str {
    "ok"
}

async fn create_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Json(req): Json<lists::CreateListRequest>,
) -> Result<(StatusCode, Json<ListView>), ApiError> {
    let view = lists::create_list(&server, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_lists(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
) -> Result<Json<Vec<ListView>>, ApiError> {
    Ok(Json(lists::list_lists(&server, &actor).await?))
}

async fn get_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<Json<ListView>, ApiError> {
    Ok(Json(lists::get_list(&server, &actor, &list_id).await?))
}

async fn update_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
    Json(body): Json<UpdateListBody>,
) -> Result<Json<ListView>, ApiError> {
    let view = lists::update_list(&server, &actor, &list_id, body.into()).await?;
    Ok(Json(view))
}

async fn archive_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<Json<ListView>, ApiError> {
    Ok(Json(
        lists::set_archived(&server, &actor, &list_id, true).await?,
    ))
}

async fn unarchive_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<Json<ListView>, ApiError> {
    Ok(Json(
        lists::set_archived(&server, &actor, &list_id, false).await?,
    ))
}

async fn delete_list(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<StatusCode, ApiError> {
    lists::delete_list(&server, &actor, &list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_members(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<Json<Vec<Member>>, ApiError> {
    Ok(Json(members::list_members(&server, &actor, &list_id).await?))
}

async fn add_member(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
    Json(req): Json<members::AddMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let member = members::add_member(&server, &actor, &list_id, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_member_role(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path((list_id, user_id)): Path<(ListId, UserId)>,
    Json(body): Json<RoleBody>,
) -> Result<Json<Member>, ApiError> {
    let member =
        members::update_member_role(&server, &actor, &list_id, &user_id, body.role).await?;
    Ok(Json(member))
}

async fn remove_member(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path((list_id, user_id)): Path<(ListId, UserId)>,
) -> Result<StatusCode, ApiError> {
    members::remove_member(&server, &actor, &list_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_todo(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
    Json(req): Json<todos::CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = todos::create_todo(&server, &actor, &list_id, req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(todo_id): Path<TodoId>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(todos::get_todo(&server, &actor, &todo_id).await?))
}

async fn update_todo(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(todo_id): Path<TodoId>,
    Json(body): Json<UpdateTodoBody>,
) -> Result<Json<Todo>, ApiError> {
    let todo = todos::update_todo(&server, &actor, &todo_id, body.into()).await?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(todo_id): Path<TodoId>,
) -> Result<StatusCode, ApiError> {
    todos::delete_todo(&server, &actor, &todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn query_todos(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Query(params): Query<TodoQueryParams>,
) -> Result<Json<TodoPageBody>, ApiError> {
    let (list_id, query) = params.into_query();
    let page = todos::query_todos(&server, &actor, list_id, query).await?;
    Ok(Json(TodoPageBody {
        items: page.items,
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
    }))
}

/// Server-sent events feed of one list's change notifications.
async fn list_events(
    State(server): State<TaskhubServer>,
    Actor(actor): Actor,
    Path(list_id): Path<ListId>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let access = server.effective_permissions(&actor, &list_id).await?;
    // Change feeds carry member activity; public read access is not enough.
    if access.role.is_none() {
        return Err(ApiError::Forbidden);
    }

    let stream = server
        .events
        .subscribe(&list_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map(|event| Event::default().json_data(&event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
