//! List and membership records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListId, Patch, Role, UserId};

/// Who can see a list without holding membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Public,
}

/// Error type for parsing Visibility from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVisibilityError(pub String);

impl std::fmt::Display for ParseVisibilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid visibility: {}", self.0)
    }
}

impl std::error::Error for ParseVisibilityError {}

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            _ => Err(ParseVisibilityError(s.to_string())),
        }
    }
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

/// A user's association with a list, unique per (list_id, user_id).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<UserId>,
}

/// List record. The member set is fetched alongside via `list_members`.
#[derive(Clone, Debug, Serialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    /// Immutable after creation.
    pub created_by: UserId,
    pub is_archived: bool,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a list.
///
/// The store inserts the list row and the creator's Owner membership in one
/// transaction, so a list is never observable with an empty member set.
#[derive(Clone, Debug)]
pub struct CreateListParams {
    pub id: ListId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub created_by: UserId,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Partial update of list metadata. Absent fields stay unchanged.
#[derive(Clone, Debug, Default)]
pub struct ListMetaPatch {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub visibility: Option<Visibility>,
    pub color: Patch<String>,
    pub icon: Patch<String>,
}

impl ListMetaPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_keep()
            && self.visibility.is_none()
            && self.color.is_keep()
            && self.icon.is_keep()
    }
}
