//! Remote store client
//!
//! CRUD against the network-backed persistence service, always scoped to
//! an owner identity. Every call can fail; the error type distinguishes
//! "could not reach the service" from "the service said no", because the
//! hybrid repository treats those two very differently.

mod http;

pub use http::HttpRemoteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::models::{RecordId, SyncRecord};

/// Result type alias for remote store operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Errors from the remote store
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No connectivity, request timed out, or the service is unreachable.
    /// Always recoverable by falling back to the local store.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The service responded with a definite error (validation, not
    /// found, permission). Recoverable only for the update-of-an-unsynced
    /// record case; otherwise logged and suppressed.
    #[error("Remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl RemoteError {
    /// Create a rejection from a status code and message
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// True when the service reported that the target record does not
    /// exist remotely, the trigger for the create-instead recovery path
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::Rejected {
                status: status.as_u16(),
                message: error.to_string(),
            },
            // Timeouts, connection refusals, and DNS failures all mean
            // the service could not be reached.
            None => Self::Unavailable(error.to_string()),
        }
    }
}

/// Configuration for the remote store
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    /// Service base URL (e.g. `https://project.example.co`)
    pub base_url: Option<String>,
    /// API key sent with every request
    pub api_key: Option<String>,
    /// Bound on every request; elapsed timeouts degrade to `Unavailable`
    pub timeout: Option<Duration>,
}

impl RemoteConfig {
    /// Default per-request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new remote configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check if a remote is configured
    pub const fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }
}

/// Trait for owner-scoped remote CRUD
///
/// Mirrors the local store's surface, but every call requires the owning
/// identity and may fail with a [`RemoteError`].
#[async_trait]
pub trait RemoteStore<T: SyncRecord>: Send + Sync {
    /// Create a record; the returned record's id is authoritative
    async fn create(&self, owner_id: &str, record: &T) -> RemoteResult<T>;

    /// Partially update a record by id, stamping `updated_at`
    ///
    /// Fails not-found when no remote row matches the id for this owner.
    async fn update(
        &self,
        owner_id: &str,
        id: &RecordId,
        patch: &T::Patch,
        updated_at: DateTime<Utc>,
    ) -> RemoteResult<()>;

    /// Delete a record by id
    async fn delete(&self, owner_id: &str, id: &RecordId) -> RemoteResult<()>;

    /// Every record owned by this identity, newest `created_at` first
    async fn fetch_all(&self, owner_id: &str) -> RemoteResult<Vec<T>>;

    /// Delete every record owned by this identity
    async fn clear(&self, owner_id: &str) -> RemoteResult<()>;
}
