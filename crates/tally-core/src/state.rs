//! Shared sync state types.

/// Whether a record's last write reached the remote store.
///
/// The error channel is reserved for local-store failures, so callers
/// read this state to tell "saved on this device" apart from "synced".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No remote is configured for this session; the write is device-only.
    LocalOnly,
    /// The local write succeeded but the remote write was not confirmed.
    Pending,
    /// Local and remote stores agree on this write.
    Synced,
}

impl SyncState {
    /// True when the write is durable on this device (always, by contract).
    pub const fn is_saved(self) -> bool {
        matches!(self, Self::LocalOnly | Self::Pending | Self::Synced)
    }

    /// True when the remote store confirmed the write.
    pub const fn is_synced(self) -> bool {
        matches!(self, Self::Synced)
    }
}
