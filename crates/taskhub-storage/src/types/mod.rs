//! Type definitions for taskhub storage.

mod ids;
mod lists;
mod patch;
mod roles;
mod todos;
mod users;

// Re-export all types from submodules
pub use ids::*;
pub use lists::*;
pub use patch::*;
pub use roles::*;
pub use todos::*;
pub use users::*;
