//! Shared test helpers.

use std::sync::Arc;

use taskhub_events_memory::MemoryEventBus;
use taskhub_storage::{CreateUserParams, ListId, Role, Store, Todo, UserId, Visibility};
use taskhub_store_sqlite::SqliteStore;

use crate::handlers::{lists, members, todos};
use crate::server::TaskhubServer;

/// Create a TaskhubServer backed by in-memory SQLite.
pub async fn create_test_server() -> TaskhubServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let events = Arc::new(MemoryEventBus::new());
    TaskhubServer::new(store, events)
}

pub async fn create_test_user(server: &TaskhubServer, email: &str, handle: &str) -> UserId {
    server
        .store
        .create_user(&CreateUserParams {
            email: email.to_string(),
            handle: handle.to_string(),
            display_name: None,
        })
        .await
        .unwrap()
}

pub async fn create_test_list(server: &TaskhubServer, owner: &UserId, name: &str) -> ListId {
    create_list_with_visibility(server, owner, name, Visibility::Private).await
}

pub async fn create_list_with_visibility(
    server: &TaskhubServer,
    owner: &UserId,
    name: &str,
    visibility: Visibility,
) -> ListId {
    lists::create_list(
        server,
        owner,
        lists::CreateListRequest {
            name: name.to_string(),
            description: None,
            visibility,
            color: None,
            icon: None,
        },
    )
    .await
    .unwrap()
    .list
    .id
}

/// Add a user (by handle) to a list with the given role, acting as `actor`.
pub async fn add_test_member(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    handle: &str,
    role: Role,
) {
    members::add_member(
        server,
        actor,
        list_id,
        members::AddMemberRequest {
            identifier: handle.to_string(),
            role,
        },
    )
    .await
    .unwrap();
}

pub async fn create_test_todo(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    name: &str,
) -> Todo {
    todos::create_todo(server, actor, list_id, todo_request(name))
        .await
        .unwrap()
}

/// A minimal create-todo request with the given name.
pub fn todo_request(name: &str) -> todos::CreateTodoRequest {
    todos::CreateTodoRequest {
        name: name.to_string(),
        description: None,
        due_date: None,
        status: taskhub_storage::TodoStatus::NotStarted,
        priority: None,
        tags: Default::default(),
        assignee_id: None,
    }
}
