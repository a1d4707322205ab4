//! The Store trait that backends implement.

use crate::query::{TodoPage, TodoQuery};
use crate::types::*;
use crate::StoreError;

/// The storage trait the taskhub core depends on.
///
/// Backend crates (e.g. taskhub-store-sqlite) implement this so the core
/// doesn't depend on any specific database engine or schema details. Todo
/// queries are always scoped by an explicit set of list ids; the caller is
/// responsible for computing the visible scope first.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Create a new user (returns generated ID). Fails `AlreadyExists` when
    /// the email or handle is taken.
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserId, StoreError>;

    /// Get user by ID.
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<User, StoreError>;

    /// Get user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Get user by handle.
    async fn get_user_by_handle(&self, handle: &str) -> Result<User, StoreError>;

    // ───────────────────────────────────── Lists ──────────────────────────────────────────

    /// Create a list together with its creator's Owner membership, in one
    /// transaction. A list is never visible with an empty member set.
    async fn create_list(&self, params: &CreateListParams) -> Result<List, StoreError>;

    /// Get list by ID.
    async fn get_list(&self, list_id: &ListId) -> Result<List, StoreError>;

    /// All lists where the user is a member.
    async fn list_lists_for_user(&self, user_id: &UserId) -> Result<Vec<List>, StoreError>;

    /// Persist new list metadata (name/description/visibility/color/icon).
    /// Refreshes `updated_at`; `created_by` and `is_archived` are not touched.
    async fn update_list_meta(&self, list: &List) -> Result<(), StoreError>;

    /// Set the archived flag.
    async fn set_archived(&self, list_id: &ListId, archived: bool) -> Result<(), StoreError>;

    /// Delete a list, cascading over its members and todos in a single
    /// transaction. Partial deletion must never be observable.
    async fn delete_list(&self, list_id: &ListId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Members ────────────────────────────────────────

    /// Get one member record; `NotFound` when the user is not a member.
    async fn get_member(&self, list_id: &ListId, user_id: &UserId) -> Result<Member, StoreError>;

    /// All members of a list.
    async fn list_members(&self, list_id: &ListId) -> Result<Vec<Member>, StoreError>;

    /// Append a member. Fails `AlreadyExists` for a duplicate (list, user) pair.
    async fn add_member(&self, list_id: &ListId, member: &Member) -> Result<(), StoreError>;

    /// Change an existing member's role.
    async fn update_member_role(
        &self,
        list_id: &ListId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError>;

    /// Remove a member record.
    async fn remove_member(&self, list_id: &ListId, user_id: &UserId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Todos ──────────────────────────────────────────

    /// Create a todo in a list.
    async fn create_todo(&self, params: &CreateTodoParams) -> Result<Todo, StoreError>;

    /// Get todo by ID.
    async fn get_todo(&self, todo_id: &TodoId) -> Result<Todo, StoreError>;

    /// Persist an updated todo. `list_id` is immutable; backends ignore any
    /// attempt to move a todo between lists. Refreshes `updated_at`.
    async fn update_todo(&self, todo: &Todo) -> Result<(), StoreError>;

    /// Delete a todo.
    async fn delete_todo(&self, todo_id: &TodoId) -> Result<(), StoreError>;

    /// Run a filter/sort/page query over the todos of the given lists.
    async fn query_todos(
        &self,
        list_ids: &[ListId],
        query: &TodoQuery,
    ) -> Result<TodoPage, StoreError>;
}
