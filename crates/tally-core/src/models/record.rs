//! Record identity and the sync contract shared by all entity types.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unique record identifier.
///
/// Generated client-side as a UUID v7 (time-sortable) so that local-first
/// writes are visible before any network round trip, but stored as an
/// opaque string: the remote store may confirm a create under its own id,
/// and that id becomes authoritative for the record from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new unique record ID using UUID v7
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// The contract every synchronized entity type implements.
///
/// The hybrid repository, local stores, remote client, and deduplication
/// engine are all generic over this trait, so the write-through and
/// id-coordination policy has exactly one implementation.
pub trait SyncRecord: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Remote collection (and sync-queue tag) this record belongs to.
    const TABLE: &'static str;

    /// Explicit list of mutable fields for partial updates.
    ///
    /// Only fields present in the patch change on merge; absent fields are
    /// never cleared.
    type Patch: Serialize + Send + Sync;

    /// Join key between the local and remote copies of this record.
    fn id(&self) -> &RecordId;

    /// Replace the id, used when the remote store confirms a create under
    /// a different identifier.
    fn set_id(&mut self, id: RecordId);

    /// Owning user identity; absent for anonymous/offline-only sessions.
    fn owner_id(&self) -> Option<&str>;

    fn set_owner_id(&mut self, owner_id: Option<String>);

    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Sole tie-breaker for last-write-wins conflict resolution.
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp a new mutation timestamp.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Merge the patch's supplied fields into this record.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Stable hash of the domain fields only.
    ///
    /// Identity, owner, and timestamps are excluded so that two records
    /// created by racing sync paths hash identically. List-valued fields
    /// are normalized before hashing.
    fn content_signature(&self) -> String;
}

/// Hash a canonical serialization of signature fields with SHA-256.
pub(crate) fn hash_signature<S: Serialize>(fields: &S) -> String {
    use sha2::{Digest, Sha256};

    let canonical = serde_json::to_vec(fields).unwrap_or_default();
    let digest = Sha256::digest(&canonical);
    format!("{digest:x}")
}
