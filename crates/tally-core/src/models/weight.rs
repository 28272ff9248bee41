//! Weight entry model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{hash_signature, RecordId, SyncRecord};

/// A body-weight measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Unique identifier, shared by the local and remote copies
    pub id: RecordId,
    /// Owning user; absent for anonymous sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Measured weight in kilograms
    pub kilograms: f64,
    /// Day the measurement was taken
    pub recorded_on: NaiveDate,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller when logging a weight
#[derive(Debug, Clone)]
pub struct WeightDraft {
    pub kilograms: f64,
    pub recorded_on: NaiveDate,
}

/// The mutable fields of a weight entry
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeightPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kilograms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_on: Option<NaiveDate>,
}

impl WeightEntry {
    /// Create a new entry from a draft with a fresh id and timestamps
    #[must_use]
    pub fn new(draft: WeightDraft) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::generate(),
            owner_id: None,
            kilograms: draft.kilograms,
            recorded_on: draft.recorded_on,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Serialize)]
struct WeightSignature {
    kilograms: f64,
    recorded_on: NaiveDate,
}

impl SyncRecord for WeightEntry {
    const TABLE: &'static str = "weight_entries";

    type Patch = WeightPatch;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn set_owner_id(&mut self, owner_id: Option<String>) {
        self.owner_id = owner_id;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    fn apply_patch(&mut self, patch: &WeightPatch) {
        if let Some(kilograms) = patch.kilograms {
            self.kilograms = kilograms;
        }
        if let Some(recorded_on) = patch.recorded_on {
            self.recorded_on = recorded_on;
        }
    }

    fn content_signature(&self) -> String {
        hash_signature(&WeightSignature {
            kilograms: self.kilograms,
            recorded_on: self.recorded_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(kilograms: f64) -> WeightDraft {
        WeightDraft {
            kilograms,
            recorded_on: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        }
    }

    #[test]
    fn test_new_entry_from_draft() {
        let entry = WeightEntry::new(draft(72.4));
        assert_eq!(entry.kilograms, 72.4);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn test_apply_patch() {
        let mut entry = WeightEntry::new(draft(72.4));
        entry.apply_patch(&WeightPatch {
            kilograms: Some(71.9),
            recorded_on: None,
        });
        assert_eq!(entry.kilograms, 71.9);
        assert_eq!(
            entry.recorded_on,
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_signature_matches_for_identical_measurements() {
        let a = WeightEntry::new(draft(70.0));
        let b = WeightEntry::new(draft(70.0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.content_signature(), b.content_signature());
    }

    #[test]
    fn test_signature_differs_on_value() {
        let a = WeightEntry::new(draft(70.0));
        let b = WeightEntry::new(draft(69.0));
        assert_ne!(a.content_signature(), b.content_signature());
    }
}
