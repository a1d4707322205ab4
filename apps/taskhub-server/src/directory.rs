//! User directory collaborator: turns invite identifiers into user ids.

use std::sync::Arc;

use async_trait::async_trait;
use taskhub_storage::{Store, StoreError, UserId};

use crate::error::ApiError;

/// Resolution of external identifiers (email or handle) to user ids.
///
/// Modeled as a trait so deployments can plug in an external directory; the
/// default implementation resolves against the local user table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an email address or handle. Fails `NotFound` when nothing
    /// matches.
    async fn resolve_identifier(&self, identifier: &str) -> Result<UserId, ApiError>;

    /// Whether a user id refers to an existing user.
    async fn exists(&self, user_id: &UserId) -> Result<bool, ApiError>;
}

/// Directory backed by the store's own user table.
pub struct StoreDirectory {
    store: Arc<dyn Store>,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserDirectory for StoreDirectory {
    async fn resolve_identifier(&self, identifier: &str) -> Result<UserId, ApiError> {
        // Identifiers with an '@' are emails, everything else is a handle.
        let result = if identifier.contains('@') {
            self.store.get_user_by_email(identifier).await
        } else {
            self.store.get_user_by_handle(identifier).await
        };
        match result {
            Ok(user) => Ok(user.id),
            Err(StoreError::NotFound) => Err(ApiError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, user_id: &UserId) -> Result<bool, ApiError> {
        match self.store.get_user_by_id(user_id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
