//! Handler functions organized by domain:
//! - lists: create, get, list, update metadata, archive/unarchive, delete
//! - members: add, change role, remove, list
//! - todos: create, get, update, delete, query
//!
//! Every handler takes the authenticated actor's user id from the boundary
//! and runs the permission evaluator before touching state. Checks run in
//! validation → existence → permission → invariant order.

pub mod lists;
pub mod members;
pub mod todos;

use serde::Serialize;
use taskhub_storage::{Capabilities, List, Member, Role};

/// A list as returned to clients: the record plus the caller's computed
/// role and capabilities. Member identities are included only for members.
#[derive(Clone, Debug, Serialize)]
pub struct ListView {
    #[serde(flatten)]
    pub list: List,
    pub user_role: Option<Role>,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
}
