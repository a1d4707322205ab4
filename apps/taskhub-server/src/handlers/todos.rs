//! Todo handlers: create, get, update, delete, query.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhub_events::EventType;
use taskhub_storage::{
    Assignee, CreateTodoParams, ListId, Priority, Store, StoreError, Todo, TodoId, TodoPage,
    TodoPatch, TodoQuery, TodoStatus, UserId, UserSummary,
};

use crate::error::ApiError;
use crate::server::TaskhubServer;

#[derive(Clone, Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: TodoStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Defaults to the creating actor.
    #[serde(default)]
    pub assignee_id: Option<UserId>,
}

fn default_status() -> TodoStatus {
    TodoStatus::NotStarted
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("todo name must not be empty".into()));
    }
    Ok(name.to_string())
}

/// Swap a bare assignee id for a user summary where the user still exists.
/// A dangling id (user deleted out from under the todo) stays unresolved.
async fn resolve_assignee(server: &TaskhubServer, todo: &mut Todo) -> Result<(), ApiError> {
    let id = todo.assignee.user_id();
    match server.store.get_user_by_id(&id).await {
        Ok(user) => {
            todo.assignee = Assignee::Resolved {
                user: UserSummary::from(&user),
            };
            Ok(())
        }
        Err(StoreError::NotFound) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn create_todo(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    req: CreateTodoRequest,
) -> Result<Todo, ApiError> {
    let name = validate_name(&req.name)?;

    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_edit {
        return Err(ApiError::Forbidden);
    }
    if access.list.is_archived {
        return Err(ApiError::InvalidOperation("list is archived".into()));
    }

    let assignee_id = match req.assignee_id {
        Some(id) => {
            if !server.directory.exists(&id).await? {
                return Err(ApiError::NotFound);
            }
            id
        }
        None => *actor,
    };

    let mut todo = server
        .store
        .create_todo(&CreateTodoParams {
            id: TodoId::new(),
            list_id: *list_id,
            assignee_id,
            name,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
            priority: req.priority,
            tags: req.tags,
        })
        .await?;

    server
        .notify(
            EventType::TodoCreated,
            list_id,
            actor,
            serde_json::json!({ "todo_id": todo.id }),
        )
        .await;

    resolve_assignee(server, &mut todo).await?;
    Ok(todo)
}

pub async fn get_todo(
    server: &TaskhubServer,
    actor: &UserId,
    todo_id: &TodoId,
) -> Result<Todo, ApiError> {
    let mut todo = server.store.get_todo(todo_id).await?;
    // Visibility follows the list: a non-viewable list hides its todos.
    server.effective_permissions(actor, &todo.list_id).await?;
    resolve_assignee(server, &mut todo).await?;
    Ok(todo)
}

pub async fn update_todo(
    server: &TaskhubServer,
    actor: &UserId,
    todo_id: &TodoId,
    patch: TodoPatch,
) -> Result<Todo, ApiError> {
    if let Some(ref name) = patch.name {
        validate_name(name)?;
    }

    let mut todo = server.store.get_todo(todo_id).await?;
    let access = server.effective_permissions(actor, &todo.list_id).await?;
    if !access.capabilities.can_edit {
        return Err(ApiError::Forbidden);
    }
    if access.list.is_archived {
        return Err(ApiError::InvalidOperation("list is archived".into()));
    }

    if let Some(name) = patch.name {
        todo.name = name.trim().to_string();
    }
    todo.description = patch.description.apply_to(todo.description);
    todo.due_date = patch.due_date.apply_to(todo.due_date);
    if let Some(status) = patch.status {
        todo.status = status;
    }
    todo.priority = patch.priority.apply_to(todo.priority);
    if let Some(tags) = patch.tags {
        todo.tags = tags;
    }
    if let Some(assignee_id) = patch.assignee_id {
        if !server.directory.exists(&assignee_id).await? {
            return Err(ApiError::NotFound);
        }
        todo.assignee = Assignee::Unresolved { id: assignee_id };
    }
    todo.updated_at = Utc::now();

    server.store.update_todo(&todo).await?;
    server
        .notify(
            EventType::TodoUpdated,
            &todo.list_id,
            actor,
            serde_json::json!({ "todo_id": todo.id }),
        )
        .await;

    resolve_assignee(server, &mut todo).await?;
    Ok(todo)
}

pub async fn delete_todo(
    server: &TaskhubServer,
    actor: &UserId,
    todo_id: &TodoId,
) -> Result<(), ApiError> {
    let todo = server.store.get_todo(todo_id).await?;
    let access = server.effective_permissions(actor, &todo.list_id).await?;
    if !access.capabilities.can_delete {
        return Err(ApiError::Forbidden);
    }
    if access.list.is_archived {
        return Err(ApiError::InvalidOperation("list is archived".into()));
    }

    server.store.delete_todo(todo_id).await?;
    server
        .notify(
            EventType::TodoDeleted,
            &todo.list_id,
            actor,
            serde_json::json!({ "todo_id": todo.id }),
        )
        .await;
    Ok(())
}

/// Run a filter/sort/page query.
///
/// With a target list the caller needs view capability on it; without one
/// the scope is the union of all lists where the caller is a member.
pub async fn query_todos(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: Option<ListId>,
    query: TodoQuery,
) -> Result<TodoPage, ApiError> {
    if query.page < 1 {
        return Err(ApiError::Validation("page must be at least 1".into()));
    }
    if query.limit < 1 {
        return Err(ApiError::Validation("limit must be at least 1".into()));
    }

    let scope: Vec<ListId> = match list_id {
        Some(list_id) => {
            let access = server.effective_permissions(actor, &list_id).await?;
            if !access.capabilities.can_view {
                return Err(ApiError::Forbidden);
            }
            vec![list_id]
        }
        None => server
            .store
            .list_lists_for_user(actor)
            .await?
            .into_iter()
            .map(|l| l.id)
            .collect(),
    };

    let mut page = server.store.query_todos(&scope, &query).await?;
    for todo in &mut page.items {
        resolve_assignee(server, todo).await?;
    }
    Ok(page)
}
