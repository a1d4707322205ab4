//! Todo lifecycle tests: capability gating, archival blocking, patches,
//! assignee resolution.

use taskhub_storage::{Assignee, Patch, Priority, Role, TodoPatch, TodoStatus, Visibility};

use super::common::*;
use crate::error::ApiError;
use crate::handlers::{lists, todos};

#[tokio::test]
async fn create_todo_requires_edit_capability() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "chores").await;
    add_test_member(&server, &alice, &list_id, "bob", Role::Viewer).await;

    let result = todos::create_todo(&server, &bob, &list_id, todo_request("vacuum")).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn public_read_access_does_not_permit_todo_creation() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_list_with_visibility(&server, &alice, "town hall", Visibility::Public).await;

    let result = todos::create_todo(&server, &bob, &list_id, todo_request("graffiti")).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn archived_list_blocks_todo_mutation_but_not_reads() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let list_id = create_test_list(&server, &alice, "old project").await;
    let todo = create_test_todo(&server, &alice, &list_id, "leftover").await;

    lists::set_archived(&server, &alice, &list_id, true)
        .await
        .unwrap();

    let result = todos::create_todo(&server, &alice, &list_id, todo_request("new work")).await;
    assert!(matches!(result, Err(ApiError::InvalidOperation(_))));

    let patch = TodoPatch {
        status: Some(TodoStatus::Completed),
        ..Default::default()
    };
    let result = todos::update_todo(&server, &alice, &todo.id, patch).await;
    assert!(matches!(result, Err(ApiError::InvalidOperation(_))));

    let result = todos::delete_todo(&server, &alice, &todo.id).await;
    assert!(matches!(result, Err(ApiError::InvalidOperation(_))));

    // Existing todos remain readable.
    let fetched = todos::get_todo(&server, &alice, &todo.id).await.unwrap();
    assert_eq!(fetched.name, "leftover");
}

#[tokio::test]
async fn unarchiving_restores_todo_mutation() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let list_id = create_test_list(&server, &alice, "seasonal").await;

    lists::set_archived(&server, &alice, &list_id, true)
        .await
        .unwrap();
    lists::set_archived(&server, &alice, &list_id, false)
        .await
        .unwrap();

    let todo = todos::create_todo(&server, &alice, &list_id, todo_request("back on"))
        .await
        .unwrap();
    assert_eq!(todo.name, "back on");
}

#[tokio::test]
async fn update_todo_applies_patch_fields() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let list_id = create_test_list(&server, &alice, "chores").await;

    let mut request = todo_request("vacuum");
    request.priority = Some(Priority::Low);
    request.description = Some("the whole flat".to_string());
    let todo = todos::create_todo(&server, &alice, &list_id, request)
        .await
        .unwrap();

    let patch = TodoPatch {
        name: Some("vacuum upstairs".to_string()),
        status: Some(TodoStatus::InProgress),
        priority: Patch::Set(Priority::High),
        description: Patch::Clear,
        ..Default::default()
    };
    let updated = todos::update_todo(&server, &alice, &todo.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.name, "vacuum upstairs");
    assert_eq!(updated.status, TodoStatus::InProgress);
    assert_eq!(updated.priority, Some(Priority::High));
    assert_eq!(updated.description, None);
    // Untouched fields carry over.
    assert_eq!(updated.list_id, list_id);
}

#[tokio::test]
async fn delete_todo_requires_delete_capability() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "chores").await;
    add_test_member(&server, &alice, &list_id, "bob", Role::Editor).await;
    let todo = create_test_todo(&server, &bob, &list_id, "disposable").await;

    // Editors can create and edit, but not delete.
    let result = todos::delete_todo(&server, &bob, &todo.id).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));

    todos::delete_todo(&server, &alice, &todo.id).await.unwrap();
}

#[tokio::test]
async fn assignee_defaults_to_creator_and_resolves_to_summary() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let list_id = create_test_list(&server, &alice, "chores").await;

    let todo = create_test_todo(&server, &alice, &list_id, "vacuum").await;
    match &todo.assignee {
        Assignee::Resolved { user } => {
            assert_eq!(user.id, alice);
            assert_eq!(user.handle, "alice");
        }
        Assignee::Unresolved { .. } => panic!("assignee should resolve for an existing user"),
    }
}

#[tokio::test]
async fn assigning_an_unknown_user_is_not_found() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let list_id = create_test_list(&server, &alice, "chores").await;

    let mut request = todo_request("vacuum");
    request.assignee_id = Some(taskhub_storage::UserId::new());
    let result = todos::create_todo(&server, &alice, &list_id, request).await;
    assert!(matches!(result, Err(ApiError::NotFound)));

    let todo = create_test_todo(&server, &alice, &list_id, "dust").await;
    let patch = TodoPatch {
        assignee_id: Some(taskhub_storage::UserId::new()),
        ..Default::default()
    };
    let result = todos::update_todo(&server, &alice, &todo.id, patch).await;
    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn reassignment_resolves_the_new_assignee() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "chores").await;
    add_test_member(&server, &alice, &list_id, "bob", Role::Editor).await;
    let todo = create_test_todo(&server, &alice, &list_id, "vacuum").await;

    let patch = TodoPatch {
        assignee_id: Some(bob),
        ..Default::default()
    };
    let updated = todos::update_todo(&server, &alice, &todo.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.assignee.user_id(), bob);
}

#[tokio::test]
async fn todos_in_private_lists_are_hidden_from_non_members() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice@example.com", "alice").await;
    let bob = create_test_user(&server, "bob@example.com", "bob").await;
    let list_id = create_test_list(&server, &alice, "secret plans").await;
    let todo = create_test_todo(&server, &alice, &list_id, "surprise party").await;

    let result = todos::get_todo(&server, &bob, &todo.id).await;
    assert!(matches!(result, Err(ApiError::NotFound)));
}
