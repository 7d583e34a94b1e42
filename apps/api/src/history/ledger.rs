use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::store::{Collection, Persisted, RecordStore, StoreError};

/// Snapshot of one advisory request and the answer it got. Immutable once
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The user's entries in the order they were written.
pub fn load_history(store: &RecordStore, username: &str) -> Vec<HistoryEntry> {
    let Some(raw) = store.get::<Vec<Value>>(Collection::History, username) else {
        return Vec::new();
    };
    raw.into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping malformed history entry for {username}: {e}");
                None
            }
        })
        .collect()
}

/// Most recent first, for display and export.
pub fn most_recent_first(entries: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    entries.iter().rev().collect()
}

/// Appends to the user's ledger (creating it if needed) and returns the
/// user's full ledger after the append.
pub fn append_entry(
    store: &RecordStore,
    username: &str,
    entry: HistoryEntry,
) -> Persisted<Vec<HistoryEntry>> {
    let value = match serde_json::to_value(&entry) {
        Ok(v) => v,
        Err(e) => {
            let mut current = load_history(store, username);
            current.push(entry);
            return Persisted::new(current, Err(StoreError::from(e)));
        }
    };

    let appended = store.modify(Collection::History, |records| {
        let slot = records
            .entry(username.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(value);
        }
    });

    info!("Appended history entry for {username}");
    let mut current = load_history(store, username);
    if appended.warning.is_some() {
        // The file still holds the old ledger; keep the entry in memory.
        current.push(entry);
    }
    appended.map(|()| current)
}

/// Empties one user's ledger; other users' entries are untouched.
pub fn clear_history(store: &RecordStore, username: &str) -> Persisted<()> {
    let cleared = store.modify(Collection::History, |records| {
        records.insert(username.to_string(), Value::Array(Vec::new()));
    });
    info!("Cleared history for {username}");
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(goal: &str) -> HistoryEntry {
        HistoryEntry {
            education: "Undergraduate".into(),
            skills: "Python,Go".into(),
            interests: "AI/ML".into(),
            goal: goal.into(),
            response: format!("## Plan for {goal}"),
            created_at: None,
        }
    }

    fn store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_append_keeps_chronological_order() {
        let (_dir, store) = store();
        append_entry(&store, "u", entry("first"));
        let after = append_entry(&store, "u", entry("second"));

        let goals: Vec<_> = after.value.iter().map(|e| e.goal.as_str()).collect();
        assert_eq!(goals, vec!["first", "second"]);
        assert_eq!(load_history(&store, "u"), after.value);
    }

    #[test]
    fn test_most_recent_first_reverses_for_display() {
        let entries = vec![entry("first"), entry("second")];
        let shown: Vec<_> = most_recent_first(&entries)
            .into_iter()
            .map(|e| e.goal.as_str())
            .collect();
        assert_eq!(shown, vec!["second", "first"]);
    }

    #[test]
    fn test_clear_only_affects_owner() {
        let (_dir, store) = store();
        append_entry(&store, "u", entry("mine"));
        append_entry(&store, "v", entry("theirs"));

        clear_history(&store, "u");

        assert!(load_history(&store, "u").is_empty());
        let v = load_history(&store, "v");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].goal, "theirs");
    }

    #[test]
    fn test_unknown_user_has_empty_history() {
        let (_dir, store) = store();
        assert!(load_history(&store, "nobody").is_empty());
    }

    #[test]
    fn test_reads_entries_without_timestamp() {
        let (_dir, store) = store();
        store
            .save(
                Collection::History,
                &serde_json::json!({
                    "u": [
                        {"education": "Other", "skills": "", "interests": "", "goal": "g", "response": "r"},
                        "garbage"
                    ]
                }),
            )
            .unwrap();

        let history = load_history(&store, "u");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].goal, "g");
        assert!(history[0].created_at.is_none());
    }

    #[test]
    fn test_append_repairs_non_list_slot() {
        let (_dir, store) = store();
        store
            .save(Collection::History, &serde_json::json!({"u": "oops"}))
            .unwrap();
        let after = append_entry(&store, "u", entry("fresh"));
        assert_eq!(after.value.len(), 1);
    }
}
