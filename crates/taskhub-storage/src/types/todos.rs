//! Todo records.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListId, Patch, TodoId, UserId, UserSummary};

/// Progress state of a todo.
///
/// The derived ordering (NotStarted < InProgress < Completed) is what the
/// query engine sorts by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Error type for parsing TodoStatus from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTodoStatusError(pub String);

impl std::fmt::Display for ParseTodoStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid todo status: {}", self.0)
    }
}

impl std::error::Error for ParseTodoStatusError {}

impl FromStr for TodoStatus {
    type Err = ParseTodoStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(TodoStatus::NotStarted),
            "in_progress" => Ok(TodoStatus::InProgress),
            "completed" => Ok(TodoStatus::Completed),
            _ => Err(ParseTodoStatusError(s.to_string())),
        }
    }
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::NotStarted => "not_started",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

/// Priority of a todo. Ordering: Low < Medium < High.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Error type for parsing Priority from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePriorityError(pub String);

impl std::fmt::Display for ParsePriorityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid priority: {}", self.0)
    }
}

impl std::error::Error for ParsePriorityError {}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// The user a todo is assigned to.
///
/// Storage always holds the bare id; the boundary may substitute a resolved
/// summary when returning todos to a client. Consumers must branch on which
/// form they hold instead of guessing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignee {
    Unresolved { id: UserId },
    Resolved { user: UserSummary },
}

impl Assignee {
    /// The assignee's user id, whichever form is held.
    pub fn user_id(&self) -> UserId {
        match self {
            Assignee::Unresolved { id } => *id,
            Assignee::Resolved { user } => user.id,
        }
    }
}

/// Todo record. `list_id` is immutable after creation.
#[derive(Clone, Debug, Serialize)]
pub struct Todo {
    pub id: TodoId,
    pub list_id: ListId,
    pub assignee: Assignee,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TodoStatus,
    pub priority: Option<Priority>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a todo.
#[derive(Clone, Debug)]
pub struct CreateTodoParams {
    pub id: TodoId,
    pub list_id: ListId,
    pub assignee_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TodoStatus,
    pub priority: Option<Priority>,
    pub tags: BTreeSet<String>,
}

/// Partial update of a todo. Absent fields stay unchanged; `list_id` cannot
/// be patched.
#[derive(Clone, Debug, Default)]
pub struct TodoPatch {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub due_date: Patch<DateTime<Utc>>,
    pub status: Option<TodoStatus>,
    pub priority: Patch<Priority>,
    pub tags: Option<BTreeSet<String>>,
    pub assignee_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for s in [
            TodoStatus::NotStarted,
            TodoStatus::InProgress,
            TodoStatus::Completed,
        ] {
            let parsed: TodoStatus = s.as_str().parse().unwrap();
            assert_eq!(s, parsed);
        }
    }

    #[test]
    fn test_status_ordering() {
        assert!(TodoStatus::NotStarted < TodoStatus::InProgress);
        assert!(TodoStatus::InProgress < TodoStatus::Completed);
    }

    #[test]
    fn test_priority_parse_roundtrip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            let parsed: Priority = p.as_str().parse().unwrap();
            assert_eq!(p, parsed);
        }
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        // Absent priority sorts before any present one.
        assert!(None < Some(Priority::Low));
    }

    #[test]
    fn test_parse_invalid_variants() {
        assert!("done".parse::<TodoStatus>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_assignee_user_id() {
        let id = UserId::new();
        assert_eq!(Assignee::Unresolved { id }.user_id(), id);

        let resolved = Assignee::Resolved {
            user: UserSummary {
                id,
                handle: "alice".to_string(),
                display_name: None,
            },
        };
        assert_eq!(resolved.user_id(), id);
    }
}
