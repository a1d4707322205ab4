//! End-to-end flows across lists, membership, and todos, plus change-event
//! emission.

use futures::StreamExt;
use taskhub_events::{EventBus, EventType};
use taskhub_storage::{Role, TodoPatch, TodoStatus};

use super::common::*;
use crate::error::ApiError;
use crate::handlers::{members, todos};

#[tokio::test]
async fn owner_handoff_end_to_end() {
    let server = create_test_server().await;
    let u = create_test_user(&server, "u@example.com", "u").await;
    let v = create_test_user(&server, "v@example.com", "v").await;
    let w = create_test_user(&server, "w@example.com", "w").await;

    // U creates the list and becomes its owner.
    let list_id = create_test_list(&server, &u, "handoff").await;

    // U adds V as editor; V can create todos.
    add_test_member(&server, &u, &list_id, "v", Role::Editor).await;
    let todo = todos::create_todo(&server, &v, &list_id, todo_request("draft agenda"))
        .await
        .unwrap();

    // U demotes V to viewer; V can no longer update the todo.
    members::update_member_role(&server, &u, &list_id, &v, Role::Viewer)
        .await
        .unwrap();
    let patch = TodoPatch {
        status: Some(TodoStatus::Completed),
        ..Default::default()
    };
    let result = todos::update_todo(&server, &v, &todo.id, patch).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));

    // U cannot remove themselves while sole owner.
    let result = members::remove_member(&server, &u, &list_id, &u).await;
    assert!(matches!(result, Err(ApiError::InvalidOperation(_))));

    // After adding W as a second owner, U can leave; W remains sole owner.
    add_test_member(&server, &u, &list_id, "w", Role::Owner).await;
    members::remove_member(&server, &u, &list_id, &u)
        .await
        .unwrap();

    let remaining = members::list_members(&server, &w, &list_id).await.unwrap();
    let owners: Vec<_> = remaining
        .iter()
        .filter(|m| m.role == Role::Owner)
        .collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].user_id, w);
}

#[tokio::test]
async fn mutations_emit_change_events_in_order() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "watched").await;

    let mut stream = server.events.subscribe(&list_id).await.unwrap();

    add_test_member(&server, &alice, &list_id, "bob", Role::Editor).await;
    let todo = create_test_todo(&server, &bob, &list_id, "tracked").await;
    todos::delete_todo(&server, &alice, &todo.id).await.unwrap();

    let event = stream.next().await.unwrap();
    assert_eq!(event.event_type, EventType::MemberAdded);
    assert_eq!(event.list_id, list_id);
    assert_eq!(event.user_id, Some(alice));
    assert_eq!(event.data["user_id"], serde_json::json!(bob));

    let event = stream.next().await.unwrap();
    assert_eq!(event.event_type, EventType::TodoCreated);
    assert_eq!(event.user_id, Some(bob));
    assert_eq!(event.data["todo_id"], serde_json::json!(todo.id));

    let event = stream.next().await.unwrap();
    assert_eq!(event.event_type, EventType::TodoDeleted);
    assert_eq!(event.user_id, Some(alice));
}

#[tokio::test]
async fn no_op_role_change_emits_no_event() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "quiet").await;
    add_test_member(&server, &alice, &list_id, "bob", Role::Editor).await;

    let mut stream = server.events.subscribe(&list_id).await.unwrap();
    members::update_member_role(&server, &alice, &list_id, &bob, Role::Editor)
        .await
        .unwrap();
    // A real change afterwards is the first thing the stream sees.
    members::update_member_role(&server, &alice, &list_id, &bob, Role::Viewer)
        .await
        .unwrap();

    let event = stream.next().await.unwrap();
    assert_eq!(event.event_type, EventType::MemberRoleChanged);
    assert_eq!(event.data["role"], serde_json::json!(Role::Viewer));
}
