//! Server state and the permission evaluator every handler goes through.

use std::sync::Arc;

use chrono::Utc;
use taskhub_events::{EventBus, EventType, ListChangeEvent};
use taskhub_storage::{Capabilities, List, ListId, Role, Store, StoreError, UserId};

use crate::directory::{StoreDirectory, UserDirectory};
use crate::error::ApiError;
use crate::locks::ListLocks;

/// What a caller is allowed to do on one list, computed at request time.
#[derive(Clone, Debug)]
pub struct EffectiveAccess {
    pub list: List,
    /// The caller's membership role; `None` for public-list read access.
    pub role: Option<Role>,
    pub capabilities: Capabilities,
}

#[derive(Clone)]
pub struct TaskhubServer {
    pub store: Arc<dyn Store>,
    pub events: Arc<dyn EventBus>,
    pub directory: Arc<dyn UserDirectory>,
    pub(crate) locks: Arc<ListLocks>,
}

impl TaskhubServer {
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventBus>) -> Self {
        let directory = Arc::new(StoreDirectory::new(store.clone()));
        Self::with_directory(store, events, directory)
    }

    pub fn with_directory(
        store: Arc<dyn Store>,
        events: Arc<dyn EventBus>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            events,
            directory,
            locks: Arc::new(ListLocks::new()),
        }
    }

    /// Compute the caller's effective permissions on a list.
    ///
    /// Members get their role's capability set. Non-members of a public list
    /// get view-only access. Non-members of a private list get `NotFound`:
    /// the caller must not learn that the list exists. Every gated operation
    /// calls this first and fails closed.
    pub async fn effective_permissions(
        &self,
        actor: &UserId,
        list_id: &ListId,
    ) -> Result<EffectiveAccess, ApiError> {
        let list = match self.store.get_list(list_id).await {
            Ok(list) => list,
            Err(StoreError::NotFound) => return Err(ApiError::NotFound),
            Err(e) => return Err(e.into()),
        };

        match self.store.get_member(list_id, actor).await {
            Ok(member) => Ok(EffectiveAccess {
                capabilities: member.role.capabilities(),
                role: Some(member.role),
                list,
            }),
            Err(StoreError::NotFound) => match list.visibility {
                taskhub_storage::Visibility::Public => Ok(EffectiveAccess {
                    list,
                    role: None,
                    capabilities: Capabilities::read_only(),
                }),
                taskhub_storage::Visibility::Private => Err(ApiError::NotFound),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Publish a change notification after a durable mutation.
    ///
    /// Delivery is best-effort by contract; a failing bus is logged, never
    /// turned into a request failure after the state change already landed.
    pub(crate) async fn notify(
        &self,
        event_type: EventType,
        list_id: &ListId,
        actor: &UserId,
        data: serde_json::Value,
    ) {
        let event = ListChangeEvent {
            event_type,
            list_id: *list_id,
            user_id: Some(*actor),
            timestamp: Utc::now(),
            data,
        };
        if let Err(e) = self.events.publish(list_id, event).await {
            tracing::warn!(list_id = %list_id, error = %e, "failed to publish change event");
        }
    }
}
