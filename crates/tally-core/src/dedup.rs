//! Deduplication engine.
//!
//! Reads can observe the same logical item twice: once per id when local
//! and remote copies diverge in content, and once per content when an
//! offline create and a since-synced remote create raced and ended up
//! under two different ids. Both collapses live here so the tie-break
//! rules have exactly one implementation and one test surface.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::models::SyncRecord;

/// Keep one record per id, preferring the greatest `updated_at`.
///
/// A missing or unparseable timestamp sorts lowest. On equal timestamps
/// the first-encountered record is kept, so the pass is deterministic and
/// idempotent. Input order of survivors is preserved.
pub fn dedup_by_id<T: SyncRecord>(records: Vec<T>) -> Vec<T> {
    let mut slot_by_id: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut survivors: Vec<T> = Vec::with_capacity(records.len());

    for record in records {
        match slot_by_id.entry(record.id().as_str().to_string()) {
            Entry::Occupied(slot) => {
                let kept = &mut survivors[*slot.get()];
                if record.updated_at() > kept.updated_at() {
                    *kept = record;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(survivors.len());
                survivors.push(record);
            }
        }
    }

    survivors
}

/// Keep the first record per content signature, in input order.
///
/// Catches records that got two different ids from racing writers. A
/// single seen-signature set keeps this O(n); no pairwise comparison.
pub fn dedup_by_content<T: SyncRecord>(records: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.content_signature()))
        .collect()
}

/// The standard read-path collapse: id pass first, then content pass.
///
/// An id collision is an unambiguous signal; a content collision is only
/// trusted after each id already has a single survivor.
pub fn dedup<T: SyncRecord>(records: Vec<T>) -> Vec<T> {
    dedup_by_content(dedup_by_id(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordId, Task, TaskDraft, WeightDraft, WeightEntry};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry(id: &str, updated: Option<&str>, kilograms: f64) -> WeightEntry {
        let mut entry = WeightEntry::new(WeightDraft {
            kilograms,
            recorded_on: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        });
        entry.id = RecordId::from(id);
        entry.updated_at = updated.and_then(crate::models::timestamp::parse);
        entry
    }

    #[test]
    fn test_dedup_by_id_keeps_latest() {
        let input = vec![
            entry("a", Some("2024-01-01T00:00:00Z"), 70.0),
            entry("a", Some("2024-01-02T00:00:00Z"), 69.0),
        ];

        let output = dedup_by_id(input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].kilograms, 69.0);
        assert_eq!(
            output[0].updated_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_dedup_by_id_missing_timestamp_sorts_lowest() {
        let input = vec![
            entry("a", None, 70.0),
            entry("a", Some("2020-01-01T00:00:00Z"), 69.0),
        ];
        let output = dedup_by_id(input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].kilograms, 69.0);
    }

    #[test]
    fn test_dedup_by_id_tie_keeps_first_encountered() {
        let input = vec![
            entry("a", Some("2024-01-01T00:00:00Z"), 70.0),
            entry("a", Some("2024-01-01T00:00:00Z"), 69.0),
        ];
        let output = dedup_by_id(input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].kilograms, 70.0);
    }

    #[test]
    fn test_dedup_by_id_is_idempotent() {
        let input = vec![
            entry("a", Some("2024-01-01T00:00:00Z"), 70.0),
            entry("b", Some("2024-01-02T00:00:00Z"), 71.0),
            entry("a", Some("2024-01-03T00:00:00Z"), 69.0),
        ];

        let once = dedup_by_id(input);
        let twice = dedup_by_id(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dedup_by_content_keeps_first_of_identical_pair() {
        let first = Task::new(TaskDraft::new("Water plants"));
        let mut second = Task::new(TaskDraft::new("Water plants"));
        second.updated_at = first.updated_at;

        let first_id = first.id.clone();
        let output = dedup_by_content(vec![first, second]);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].id, first_id);
    }

    #[test]
    fn test_dedup_by_content_never_grows() {
        let records: Vec<Task> = (0..5)
            .map(|n| Task::new(TaskDraft::new(format!("task {n}"))))
            .collect();
        let output = dedup_by_content(records.clone());
        assert!(output.len() <= records.len());
        assert_eq!(output.len(), 5);
    }

    #[test]
    fn test_dedup_runs_id_pass_before_content_pass() {
        // Two copies of id "a" whose older copy matches "b" by content.
        // The id pass must remove the older "a" first, otherwise "b"
        // would be dropped by the content pass.
        let input = vec![
            entry("a", Some("2024-01-01T00:00:00Z"), 70.0),
            entry("a", Some("2024-01-02T00:00:00Z"), 69.0),
            entry("b", Some("2024-01-01T00:00:00Z"), 70.0),
        ];

        let output = dedup(input);
        let mut weights: Vec<f64> = output.iter().map(|e| e.kilograms).collect();
        weights.sort_by(f64::total_cmp);
        assert_eq!(weights, vec![69.0, 70.0]);
    }
}
