//! Role and capability types for list membership.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role a member holds on a list.
///
/// Roles form a strict hierarchy: Owner ⊇ Editor ⊇ Viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

/// Error type for parsing Role from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Check if this role has at least the permissions of another role
    pub fn includes(&self, other: &Role) -> bool {
        match self {
            Role::Owner => true,
            Role::Editor => matches!(other, Role::Editor | Role::Viewer),
            Role::Viewer => matches!(other, Role::Viewer),
        }
    }

    /// Capability set this role grants on its list.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Role::Owner => Capabilities {
                can_view: true,
                can_edit: true,
                can_delete: true,
                can_manage_members: true,
            },
            Role::Editor => Capabilities {
                can_view: true,
                can_edit: true,
                can_delete: false,
                can_manage_members: false,
            },
            Role::Viewer => Capabilities::read_only(),
        }
    }
}

/// Boolean permissions derived from a role (or from public-list access).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_manage_members: bool,
}

impl Capabilities {
    /// View-only access, as granted to non-members of public lists.
    pub fn read_only() -> Self {
        Self {
            can_view: true,
            can_edit: false,
            can_delete: false,
            can_manage_members: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_includes_owner() {
        assert!(Role::Owner.includes(&Role::Owner));
        assert!(Role::Owner.includes(&Role::Editor));
        assert!(Role::Owner.includes(&Role::Viewer));
    }

    #[test]
    fn test_role_includes_editor() {
        assert!(!Role::Editor.includes(&Role::Owner));
        assert!(Role::Editor.includes(&Role::Editor));
        assert!(Role::Editor.includes(&Role::Viewer));
    }

    #[test]
    fn test_role_includes_viewer() {
        assert!(!Role::Viewer.includes(&Role::Owner));
        assert!(!Role::Viewer.includes(&Role::Editor));
        assert!(Role::Viewer.includes(&Role::Viewer));
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Owner, Role::Editor, Role::Viewer] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_role_parse_invalid() {
        assert!("admin".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err()); // Case sensitive
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_capabilities_table() {
        let owner = Role::Owner.capabilities();
        assert!(owner.can_view && owner.can_edit && owner.can_delete && owner.can_manage_members);

        let editor = Role::Editor.capabilities();
        assert!(editor.can_view && editor.can_edit);
        assert!(!editor.can_delete && !editor.can_manage_members);

        let viewer = Role::Viewer.capabilities();
        assert!(viewer.can_view);
        assert!(!viewer.can_edit && !viewer.can_delete && !viewer.can_manage_members);
    }

    #[test]
    fn test_capabilities_monotonic() {
        // can_delete implies can_edit implies can_view, for every role.
        for role in [Role::Owner, Role::Editor, Role::Viewer] {
            let caps = role.capabilities();
            if caps.can_delete {
                assert!(caps.can_edit, "{:?} grants delete without edit", role);
            }
            if caps.can_edit {
                assert!(caps.can_view, "{:?} grants edit without view", role);
            }
        }
    }

    #[test]
    fn test_read_only_capabilities() {
        let caps = Capabilities::read_only();
        assert!(caps.can_view);
        assert!(!caps.can_edit && !caps.can_delete && !caps.can_manage_members);
    }
}
