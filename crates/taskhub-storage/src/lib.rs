//! Storage abstraction for taskhub.
//!
//! Backend crates (e.g. taskhub-store-sqlite) implement the [`Store`] trait so
//! the core service doesn't depend on any specific database engine or schema
//! details.

use thiserror::Error;

pub mod query;
mod store;
pub mod types;

pub use query::*;
pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
