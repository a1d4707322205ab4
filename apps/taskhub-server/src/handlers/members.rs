//! Membership handlers: add, change role, remove, list.
//!
//! All writes here are serialized per list so the at-least-one-owner
//! invariant holds under concurrent requests.

use chrono::Utc;
use serde::Deserialize;
use taskhub_events::EventType;
use taskhub_storage::{ListId, Member, Role, Store, UserId};

use crate::error::ApiError;
use crate::server::TaskhubServer;

#[derive(Clone, Debug, Deserialize)]
pub struct AddMemberRequest {
    /// Email address or handle of the user to add.
    pub identifier: String,
    pub role: Role,
}

/// Number of Owner members a list currently has.
async fn owner_count(server: &TaskhubServer, list_id: &ListId) -> Result<usize, ApiError> {
    let members = server.store.list_members(list_id).await?;
    Ok(members.iter().filter(|m| m.role == Role::Owner).count())
}

pub async fn add_member(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    req: AddMemberRequest,
) -> Result<Member, ApiError> {
    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_manage_members {
        return Err(ApiError::Forbidden);
    }

    let user_id = server.directory.resolve_identifier(&req.identifier).await?;

    let member = Member {
        user_id,
        role: req.role,
        joined_at: Utc::now(),
        invited_by: Some(*actor),
    };
    match server.store.add_member(list_id, &member).await {
        Ok(()) => {}
        Err(taskhub_storage::StoreError::AlreadyExists) => {
            return Err(ApiError::Conflict("user is already a member".into()));
        }
        Err(e) => return Err(e.into()),
    }

    server
        .notify(
            EventType::MemberAdded,
            list_id,
            actor,
            serde_json::json!({ "user_id": user_id, "role": req.role }),
        )
        .await;
    Ok(member)
}

pub async fn update_member_role(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    target: &UserId,
    new_role: Role,
) -> Result<Member, ApiError> {
    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;
    if !access.capabilities.can_manage_members {
        return Err(ApiError::Forbidden);
    }

    let mut member = server.store.get_member(list_id, target).await?;
    if member.role == new_role {
        return Ok(member);
    }

    // Demoting an Owner requires another Owner to remain. This also rejects
    // self-demotion by a sole owner.
    if member.role == Role::Owner && owner_count(server, list_id).await? <= 1 {
        return Err(ApiError::InvalidOperation(
            "cannot demote the last owner".into(),
        ));
    }

    server
        .store
        .update_member_role(list_id, target, new_role)
        .await?;
    server
        .notify(
            EventType::MemberRoleChanged,
            list_id,
            actor,
            serde_json::json!({ "user_id": target, "role": new_role }),
        )
        .await;

    member.role = new_role;
    Ok(member)
}

pub async fn remove_member(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
    target: &UserId,
) -> Result<(), ApiError> {
    let _guard = server.locks.lock(list_id).await;
    let access = server.effective_permissions(actor, list_id).await?;

    // Members may always remove themselves; removing anyone else needs the
    // manage-members capability.
    if actor != target && !access.capabilities.can_manage_members {
        return Err(ApiError::Forbidden);
    }

    let member = server.store.get_member(list_id, target).await?;
    if member.role == Role::Owner && owner_count(server, list_id).await? <= 1 {
        return Err(ApiError::InvalidOperation(
            "cannot remove the last owner".into(),
        ));
    }

    server.store.remove_member(list_id, target).await?;
    server
        .notify(
            EventType::MemberRemoved,
            list_id,
            actor,
            serde_json::json!({ "user_id": target }),
        )
        .await;
    Ok(())
}

pub async fn list_members(
    server: &TaskhubServer,
    actor: &UserId,
    list_id: &ListId,
) -> Result<Vec<Member>, ApiError> {
    let access = server.effective_permissions(actor, list_id).await?;

    // Public-list read access does not extend to member identities.
    if access.role.is_none() {
        return Err(ApiError::Forbidden);
    }
    Ok(server.store.list_members(list_id).await?)
}
