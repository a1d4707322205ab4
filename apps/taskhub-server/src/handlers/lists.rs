//! List handlers: create, get, list, update metadata, archive, delete.

use chrono::Utc;
use serde::Deserialize;
use taskhub_events::EventType;
use taskhub_storage::{
    CreateListParams, List, ListId, ListMetaPatch, Member, Role, Store, UserId, Visibility,
};

use crate::error::ApiError;
use crate::handlers::ListView;
use crate::server::{EffectiveAccess, TaskhubServer};

fn default_visibility() -> Visibility {
    Visibility::Private
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("list name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn view(list: List, role: Option<Role>, members: Option<Vec<Member>>) -> ListView {
    let capabilities = match role {
        Some(role) => role.capabilities(),
        None => taskhub_storage::Capabilities::read_only(),
    };
    ListView {
        list,
        user_role: role,
        capabilities,
        members,
    }
}

pub async fn create_list(
    server: &TaskhubServer,
    actor: &UserId,
    req: CreateListRequest,
) -> Result<ListView, ApiError> {
    let name = validate_name(&req.name)?;

    // The store inserts the list and the creator's Owner membership in one
    // transaction, so the list is never observable without an owner.
    let list = server
        .store
        .create_list(&CreateListParams {
            id: ListId::new(),
            name,
            description: req.description,
            visibility: req.visibility,
            created_by: *actor,
            color: req.color,
            icon: req.icon,
        })
        .await?;

    let members = server.store.list_members(&list.id).await?;
    Ok(view(list, Some(Role::Owner), Some(members)))
}

pub async fn get_list(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
) -> Result<ListView, ApiError> {
    let access = server.effective_permissions(actor, list_id).await?;

    // Non-members of a public list can read the list but not its membership.
    let members = if access.role.is_some() {
        Some(server.store.list_members(list_id).await?)
    } else {
        None
    };
    Ok(view(access.list, access.role, members))
}

/// All lists where the actor is a member, with their role on each.
pub async fn list_lists(server: &TaskhubServer, actor: &UserId) -> Result<Vec<ListView>, ApiError> {
    let lists = server.store.list_lists_for_user(actor).await?;
    let mut views = Vec::with_capacity(lists.len());
    for list in lists {
        let member = server.store.get_member(&list.id, actor).await?;
        views.push(view(list, Some(member.role), None));
    }
    Ok(views)
}

pub async fn update_list(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    patch: ListMetaPatch,
) -> Result<ListView, ApiError> {
    if let Some(ref name) = patch.name {
        validate_name(name)?;
    }

    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_edit {
        return Err(ApiError::Forbidden);
    }
    if patch.is_empty() {
        return Ok(view(access.list, access.role, None));
    }

    // Archiving restricts todo mutation, not list metadata; no archived
    // check here.
    let mut list = access.list;
    if let Some(name) = patch.name {
        list.name = name.trim().to_string();
    }
    list.description = patch.description.apply_to(list.description);
    if let Some(visibility) = patch.visibility {
        list.visibility = visibility;
    }
    list.color = patch.color.apply_to(list.color);
    list.icon = patch.icon.apply_to(list.icon);
    list.updated_at = Utc::now();

    server.store.update_list_meta(&list).await?;
    server
        .notify(
            EventType::ListUpdated,
            list_id,
            actor,
            serde_json::json!({ "name": list.name }),
        )
        .await;

    Ok(view(list, access.role, None))
}

pub async fn set_archived(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    archived: bool,
) -> Result<ListView, ApiError> {
    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_edit {
        return Err(ApiError::Forbidden);
    }

    // Archiving an already-archived list (and the unarchive mirror) is an
    // idempotent success, not an error.
    if access.list.is_archived == archived {
        return Ok(view(access.list, access.role, None));
    }

    server.store.set_archived(list_id, archived).await?;
    let event_type = if archived {
        EventType::ListArchived
    } else {
        EventType::ListUnarchived
    };
    server
        .notify(event_type, list_id, actor, serde_json::json!({}))
        .await;

    let EffectiveAccess { mut list, role, .. } = access;
    list.is_archived = archived;
    Ok(view(list, role, None))
}

pub async fn delete_list(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
) -> Result<(), ApiError> {
    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_delete {
        return Err(ApiError::Forbidden);
    }

    // The store cascades todos and members in the same transaction; a failed
    // cascade surfaces here rather than leaving orphaned rows.
    server.store.delete_list(list_id).await?;
    server
        .notify(EventType::ListDeleted, list_id, actor, serde_json::json!({}))
        .await;
    Ok(())
}
