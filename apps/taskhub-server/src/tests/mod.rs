//! Server unit and integration tests against real in-memory SQLite.
//!
//! Tests are organized into modules by feature area:
//! - `common` - Shared test helpers
//! - `lists` - List lifecycle and metadata tests
//! - `members` - Membership and ownership-invariant tests
//! - `todos` - Todo lifecycle and archival tests
//! - `queries` - Filter/sort/pagination tests
//! - `scenario` - End-to-end flows and event emission

pub mod common;

mod scenario;
mod todos;
