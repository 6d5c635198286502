//! Slot store: persisted slot document, schema migration, change listeners.
//!
//! The persisted document has gone through two shapes:
//!
//! - legacy: `"<slot>": "<relativePath>"`
//! - current: `"<slot>": { filePath, line, character, mode? }`
//!
//! Both are accepted on every read and normalized by [`migrate`]. Reads never
//! write the normalized form back; the next explicit [`SlotStore::write`]
//! persists the current shape.

mod file;
mod memory;

pub use file::{DOCUMENT_DIR, DOCUMENT_FILE, JsonFileStore};
pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::SlotError;
use crate::paths;
use crate::types::{Binding, Settings, Slot, SlotTable, TrackingMode};

// ─── Stored Shapes ────────────────────────────────────────────────

/// One entry of the persisted `slots` object, in either schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSlot {
    /// Legacy shape: the relative path only.
    Legacy(String),
    /// Current shape. `mode` may be missing in documents written before
    /// tracking modes existed.
    Binding(StoredBinding),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBinding {
    pub file_path: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub character: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TrackingMode>,
}

/// The slot-related keys of the project document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDocument {
    #[serde(default)]
    pub slots: BTreeMap<String, StoredSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_preview_limit: Option<i64>,
}

impl SlotDocument {
    pub fn settings(&self) -> Settings {
        Settings::from_raw(self.slot_count, self.status_preview_limit)
    }
}

// ─── Migration ────────────────────────────────────────────────────

/// Normalize a persisted `slots` object into a [`SlotTable`].
///
/// - legacy string entries become `{line: 0, character: 0, mode: auto}`
/// - a missing `mode` is backfilled to `auto`
/// - keys outside `1..=9` and paths that are empty, absolute, or escape the
///   workspace are dropped from the table; [`merge_slots`] keeps them in the
///   document
pub fn migrate(slots: &BTreeMap<String, StoredSlot>) -> SlotTable {
    let mut table = SlotTable::new();

    for (key, stored) in slots {
        match migrate_entry(key, stored) {
            Ok((slot, binding)) => {
                table.insert(slot, binding);
            }
            Err(reason) => {
                tracing::warn!(key = %key, reason, "ignoring unusable slot entry");
            }
        }
    }

    table
}

fn migrate_entry(key: &str, stored: &StoredSlot) -> Result<(Slot, Binding), &'static str> {
    let slot = key.parse::<Slot>().map_err(|_| "not a slot number 1-9")?;

    let binding = match stored {
        StoredSlot::Legacy(path) => Binding {
            file_path: path.clone(),
            line: 0,
            character: 0,
            mode: TrackingMode::Auto,
        },
        StoredSlot::Binding(b) => Binding {
            file_path: b.file_path.clone(),
            line: b.line,
            character: b.character,
            mode: b.mode.unwrap_or_default(),
        },
    };

    if !paths::is_workspace_relative(&binding.file_path) {
        return Err("path is outside the workspace");
    }
    Ok((slot, binding))
}

/// Entries of a persisted `slots` object that [`migrate`] cannot use.
pub fn unusable_entries(slots: &BTreeMap<String, StoredSlot>) -> BTreeMap<String, StoredSlot> {
    slots
        .iter()
        .filter(|(key, stored)| migrate_entry(key, stored).is_err())
        .map(|(key, stored)| (key.clone(), stored.clone()))
        .collect()
}

/// The `slots` object to persist for `table`.
///
/// Unusable entries of the `previous` object are carried over untouched
/// unless `table` now binds the same key.
pub fn merge_slots(
    previous: &BTreeMap<String, StoredSlot>,
    table: &SlotTable,
) -> BTreeMap<String, StoredSlot> {
    let mut slots = unusable_entries(previous);
    slots.extend(to_stored(table));
    slots
}

/// Serialize a table in the current schema. `mode` is always written.
pub fn to_stored(table: &SlotTable) -> BTreeMap<String, StoredSlot> {
    table
        .iter()
        .map(|(slot, b)| {
            (
                slot.to_string(),
                StoredSlot::Binding(StoredBinding {
                    file_path: b.file_path.clone(),
                    line: b.line,
                    character: b.character,
                    mode: Some(b.mode),
                }),
            )
        })
        .collect()
}

// ─── Store Trait ──────────────────────────────────────────────────

/// Callback invoked with the new table after every persisted change.
pub type ChangeListener = Box<dyn Fn(&SlotTable) + Send + Sync>;

/// Handle to the persisted slot table.
///
/// Every component takes the store as an injected handle and re-reads it
/// at the start of each operation; nothing caches the table between calls.
pub trait SlotStore: Send + Sync {
    /// Load and migrate the table. Never writes.
    fn read(&self) -> Result<SlotTable, SlotError>;

    /// Replace the persisted table and notify listeners.
    fn write(&self, table: &SlotTable) -> Result<(), SlotError>;

    /// Current `slotCount` / `statusPreviewLimit`.
    fn settings(&self) -> Result<Settings, SlotError>;

    /// Register a listener for table changes.
    fn subscribe(&self, listener: ChangeListener);

    /// Re-read after the document changed outside this process.
    fn reload(&self) -> Result<SlotTable, SlotError> {
        self.read()
    }
}

/// Listener registry shared by the store implementations.
///
/// Listeners run outside the registry lock, so they may write to the store
/// or subscribe further listeners. A listener added during a notification
/// first runs on the next one.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<Vec<Arc<dyn Fn(&SlotTable) + Send + Sync>>>,
}

impl Listeners {
    pub(crate) fn push(&self, listener: ChangeListener) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::from(listener));
    }

    pub(crate) fn notify(&self, table: &SlotTable) {
        let listeners = self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone();
        for listener in &listeners {
            listener(table);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.lock().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn slots_from(json: serde_json::Value) -> BTreeMap<String, StoredSlot> {
        serde_json::from_value(json).expect("valid slots object")
    }

    #[test]
    fn legacy_string_entry_is_upgraded() {
        let table = migrate(&slots_from(serde_json::json!({"1": "a.txt"})));

        let slot = Slot::new(1).expect("slot");
        assert_eq!(
            table.get(slot),
            Some(&Binding::new("a.txt", Position::new(0, 0), TrackingMode::Auto))
        );
        assert_eq!(
            serde_json::to_value(&table).expect("serialize"),
            serde_json::json!({
                "1": {"filePath": "a.txt", "line": 0, "character": 0, "mode": "auto"}
            })
        );
    }

    #[test]
    fn missing_mode_is_backfilled() {
        let table = migrate(&slots_from(serde_json::json!({
            "2": {"filePath": "src/lib.rs", "line": 4, "character": 1}
        })));

        let b = table.get(Slot::new(2).expect("slot")).expect("bound");
        assert_eq!(b.mode, TrackingMode::Auto);
        assert_eq!(b.position(), Position::new(4, 1));
    }

    #[test]
    fn mixed_shapes_in_one_document() {
        let table = migrate(&slots_from(serde_json::json!({
            "1": "README.md",
            "3": {"filePath": "b.rs", "line": 1, "character": 2, "mode": "static"}
        })));

        assert_eq!(table.len(), 2);
        let b = table.get(Slot::new(3).expect("slot")).expect("bound");
        assert_eq!(b.mode, TrackingMode::Static);
    }

    #[test]
    fn invalid_keys_and_paths_are_dropped() {
        let table = migrate(&slots_from(serde_json::json!({
            "0": "zero.txt",
            "10": "ten.txt",
            "abc": "x.txt",
            "4": "",
            "5": "/abs/path.txt",
            "6": "../escape.txt",
            "7": "ok.txt"
        })));

        assert_eq!(table.len(), 1);
        assert!(table.get(Slot::new(7).expect("slot")).is_some());
    }

    #[test]
    fn to_stored_writes_current_shape() {
        let table = migrate(&slots_from(serde_json::json!({"1": "a.txt"})));
        let stored = to_stored(&table);
        assert_eq!(
            stored.get("1"),
            Some(&StoredSlot::Binding(StoredBinding {
                file_path: "a.txt".into(),
                line: 0,
                character: 0,
                mode: Some(TrackingMode::Auto),
            }))
        );
    }

    #[test]
    fn negative_position_is_rejected_by_the_shape() {
        let parsed: Result<BTreeMap<String, StoredSlot>, _> = serde_json::from_value(
            serde_json::json!({"1": {"filePath": "a.txt", "line": -1, "character": 0}}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn merge_keeps_unusable_entries_unless_rebound() {
        let previous = slots_from(serde_json::json!({
            "1": "a.txt",
            "10": "ten.txt",
            "5": "/abs/path.txt"
        }));
        let b = Binding::new("b.rs", Position::new(1, 1), TrackingMode::Static);

        let table: SlotTable = [(Slot::new(2).expect("slot"), b.clone())].into_iter().collect();
        let merged = merge_slots(&previous, &table);
        assert_eq!(
            merged.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["10", "2", "5"]
        );
        assert_eq!(merged.get("10"), Some(&StoredSlot::Legacy("ten.txt".into())));

        let table: SlotTable = [(Slot::new(5).expect("slot"), b)].into_iter().collect();
        let merged = merge_slots(&previous, &table);
        assert!(matches!(merged.get("5"), Some(StoredSlot::Binding(sb)) if sb.file_path == "b.rs"));
    }

    #[test]
    fn listener_may_reenter_the_registry() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let listeners = Arc::new(Listeners::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let registry = Arc::clone(&listeners);
        let counter = Arc::clone(&calls);
        listeners.push(Box::new(move |table: &SlotTable| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                registry.push(Box::new(|_: &SlotTable| {}));
                registry.notify(table);
            }
        }));

        listeners.notify(&SlotTable::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(listeners.inner.lock().expect("lock").len(), 2);
    }
}
