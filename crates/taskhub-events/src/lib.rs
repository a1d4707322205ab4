//! Event bus abstraction for list change notifications.
//!
//! This crate defines the EventBus trait that allows different
//! implementations for event broadcasting across server replicas:
//! - Memory (single server, tokio broadcast channels)
//! - Redis (multi-server, Redis pub/sub)
//! - Postgres (multi-server, PostgreSQL LISTEN/NOTIFY)
//!
//! Events are emitted after a mutation is durably applied. The bus gives no
//! ordering or delivery guarantee beyond that; clients that fall behind are
//! expected to resync.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use taskhub_storage::{ListId, UserId};

/// Kind of change that happened on a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ListUpdated,
    ListArchived,
    ListUnarchived,
    ListDeleted,
    MemberAdded,
    MemberRoleChanged,
    MemberRemoved,
    TodoCreated,
    TodoUpdated,
    TodoDeleted,
}

/// Change-notification record for one list.
///
/// `user_id` is the actor that caused the change when one exists; `data`
/// carries event-specific detail (e.g. the todo id, the new role).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListChangeEvent {
    pub event_type: EventType,
    pub list_id: ListId,
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// Error type for event bus operations
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of list change events
pub type EventStream = Pin<Box<dyn Stream<Item = ListChangeEvent> + Send>>;

/// Event bus trait for publishing and subscribing to list change events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a change event to all watchers of this list.
    ///
    /// Called after the mutation has been durably applied to storage.
    async fn publish(&self, list_id: &ListId, event: ListChangeEvent) -> Result<(), EventBusError>;

    /// Subscribe to change events for a list.
    ///
    /// Returns a stream that yields events as they occur.
    /// The stream will continue until dropped or the connection is closed.
    async fn subscribe(&self, list_id: &ListId) -> Result<EventStream, EventBusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_equality() {
        assert_eq!(EventType::TodoCreated, EventType::TodoCreated);
        assert_ne!(EventType::TodoCreated, EventType::TodoDeleted);
        assert_ne!(EventType::MemberAdded, EventType::MemberRemoved);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = ListChangeEvent {
            event_type: EventType::MemberRoleChanged,
            list_id: ListId::new(),
            user_id: Some(UserId::new()),
            timestamp: Utc::now(),
            data: serde_json::json!({ "role": "editor" }),
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: ListChangeEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.event_type, deserialized.event_type);
        assert_eq!(event.list_id, deserialized.list_id);
        assert_eq!(event.user_id, deserialized.user_id);
        assert_eq!(event.data, deserialized.data);
    }

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::MemberRoleChanged).unwrap();
        assert_eq!(json, "\"member_role_changed\"");
    }

    #[test]
    fn test_event_bus_error_display() {
        let error = EventBusError::Backend("connection failed".to_string());
        let display = error.to_string();
        assert!(display.contains("backend error"));
        assert!(display.contains("connection failed"));
    }
}
