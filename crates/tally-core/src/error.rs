//! Error types for tally-core

use thiserror::Error;

/// Result type alias using tally-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tally-core operations
///
/// `LocalStore` is the only hard-failure class: it means the durable
/// on-device write has no guaranteed effect. Remote failures are modeled
/// separately as [`crate::remote::RemoteError`] and never surface through
/// this type once the corresponding local write has succeeded.
#[derive(Error, Debug)]
pub enum Error {
    /// The durable local store failed (quota, corruption, bad schema)
    #[error("Local store error: {0}")]
    LocalStore(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found in the local store
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
