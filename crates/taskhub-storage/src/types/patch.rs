//! Field-presence wrapper for partial updates.

/// One field of a partial-update payload.
///
/// Distinguishes "not provided, leave unchanged" from "explicitly clear",
/// which a plain `Option` cannot express.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field was absent from the payload; keep the current value.
    #[default]
    Keep,
    /// Set the field to a new value.
    Set(T),
    /// Explicitly clear the field (only meaningful for optional fields).
    Clear,
}

impl<T> Patch<T> {
    /// Resolve this patch against the current value of an optional field.
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Set(value) => Some(value),
            Patch::Clear => None,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_leaves_value_unchanged() {
        assert_eq!(Patch::Keep.apply_to(Some("a")), Some("a"));
        assert_eq!(Patch::<&str>::Keep.apply_to(None), None);
    }

    #[test]
    fn set_replaces_value() {
        assert_eq!(Patch::Set("b").apply_to(Some("a")), Some("b"));
        assert_eq!(Patch::Set("b").apply_to(None), Some("b"));
    }

    #[test]
    fn clear_removes_value() {
        assert_eq!(Patch::<&str>::Clear.apply_to(Some("a")), None);
    }

    #[test]
    fn default_is_keep() {
        assert!(Patch::<String>::default().is_keep());
    }
}
