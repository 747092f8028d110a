use thiserror::Error;

use quotedesk_core::errors::PortError;

pub mod document;
pub mod memory;
pub mod override_store;

pub use document::SqlDocumentRepository;
pub use memory::{InMemoryDocumentRepository, InMemoryOverrideRepository};
pub use override_store::SqlOverrideRepository;

/// `SQLITE_FULL`: the database or disk is full.
const SQLITE_FULL: &str = "13";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for PortError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Decode(message) => PortError::Decode(message),
            RepositoryError::Database(sqlx::Error::Database(db_error))
                if db_error.code().as_deref() == Some(SQLITE_FULL) =>
            {
                PortError::CapacityExceeded(db_error.message().to_string())
            }
            RepositoryError::Database(
                sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_),
            ) => PortError::Decode(error.to_string()),
            RepositoryError::Database(other) => PortError::Unavailable(other.to_string()),
        }
    }
}
