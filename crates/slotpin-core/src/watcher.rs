//! Consistency watcher: repair slots after files are deleted or renamed.
//!
//! Both reactions take a whole batch of paths and write the table at most
//! once. Applying the same batch twice is a no-op the second time.
//!
//! Paths in events may be absolute or relative to the workspace root. A
//! directory in an event covers every binding beneath it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::SlotError;
use crate::paths;
use crate::store::SlotStore;
use crate::types::{Slot, SlotTable};

/// One slot whose file moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedSlot {
    pub slot: Slot,
    pub old_name: String,
    pub new_name: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: Vec<RenamedSlot>,
    /// Slots cleared because their file left the workspace or was replaced
    /// by a renamed file.
    pub cleared: Vec<Slot>,
}

impl RenameReport {
    pub fn is_empty(&self) -> bool {
        self.renamed.is_empty() && self.cleared.is_empty()
    }
}

/// Pure function: drop every binding whose file is in `deleted`.
///
/// Returns the new table and the cleared slots in ascending order.
pub fn apply_deletions(table: &SlotTable, root: &Path, deleted: &[PathBuf]) -> (SlotTable, Vec<Slot>) {
    let deleted: Vec<PathBuf> = deleted.iter().map(|p| paths::absolutize(root, p)).collect();

    let mut next = table.clone();
    let mut cleared = Vec::new();
    for (slot, binding) in table.iter() {
        let location = paths::resolve(root, &binding.file_path);
        if deleted.iter().any(|d| paths::is_within(&location, d)) {
            next.remove(slot);
            cleared.push(slot);
        }
    }

    (next, cleared)
}

/// Pure function: rewrite bindings whose file moved from an old location to
/// a new one. Position and mode are kept.
pub fn apply_renames(
    table: &SlotTable,
    root: &Path,
    renames: &[(PathBuf, PathBuf)],
) -> (SlotTable, RenameReport) {
    let renames: Vec<(PathBuf, PathBuf)> = renames
        .iter()
        .map(|(old, new)| (paths::absolutize(root, old), paths::absolutize(root, new)))
        .collect();

    let mut next = table.clone();
    let mut report = RenameReport::default();
    let mut moved_paths = HashSet::new();

    for (slot, binding) in table.iter() {
        let location = paths::resolve(root, &binding.file_path);
        let Some(new_location) = renames.iter().find_map(|(old, new)| {
            let rest = location.strip_prefix(old).ok()?;
            Some(if rest.as_os_str().is_empty() {
                new.clone()
            } else {
                new.join(rest)
            })
        }) else {
            continue;
        };

        match paths::relative_path(root, &new_location) {
            Some(new_path) => {
                if new_path == binding.file_path {
                    continue;
                }
                if let Some(b) = next.get_mut(slot) {
                    b.file_path = new_path.clone();
                }
                report.renamed.push(RenamedSlot {
                    slot,
                    old_name: binding.file_name().to_string(),
                    new_name: paths::file_name(&new_path).to_string(),
                    new_path: new_path.clone(),
                });
                moved_paths.insert(new_path);
            }
            None => {
                next.remove(slot);
                report.cleared.push(slot);
            }
        }
    }

    // A file renamed over another bound file takes its place.
    let renamed_slots: HashSet<Slot> = report.renamed.iter().map(|r| r.slot).collect();
    let shadowed: Vec<Slot> = next
        .iter()
        .filter(|(s, b)| !renamed_slots.contains(s) && moved_paths.contains(&b.file_path))
        .map(|(s, _)| s)
        .collect();
    for slot in shadowed {
        next.remove(slot);
        report.cleared.push(slot);
    }
    report.cleared.sort();

    (next, report)
}

/// Applies filesystem events against an injected store.
pub struct ConsistencyWatcher<'a> {
    store: &'a dyn SlotStore,
    root: &'a Path,
}

impl<'a> ConsistencyWatcher<'a> {
    pub fn new(store: &'a dyn SlotStore, root: &'a Path) -> Self {
        Self { store, root }
    }

    /// Clear slots whose files were deleted. Returns the cleared slots.
    pub fn files_deleted(&self, deleted: &[PathBuf]) -> Result<Vec<Slot>, SlotError> {
        if deleted.is_empty() {
            return Ok(Vec::new());
        }
        let table = self.store.read()?;
        let (next, cleared) = apply_deletions(&table, self.root, deleted);
        if !cleared.is_empty() {
            self.store.write(&next)?;
            tracing::info!(?cleared, "cleared slots for deleted files");
        }
        Ok(cleared)
    }

    /// Follow renamed files. Returns what changed.
    pub fn files_renamed(&self, renames: &[(PathBuf, PathBuf)]) -> Result<RenameReport, SlotError> {
        if renames.is_empty() {
            return Ok(RenameReport::default());
        }
        let table = self.store.read()?;
        let (next, report) = apply_renames(&table, self.root, renames);
        if !report.is_empty() {
            self.store.write(&next)?;
            tracing::info!(
                renamed = report.renamed.len(),
                cleared = report.cleared.len(),
                "repaired slots for renamed files"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Binding, Position, TrackingMode};

    const ROOT: &str = "/work/proj";

    fn slot(n: u8) -> Slot {
        Slot::new(n).expect("valid slot")
    }

    fn seeded(entries: &[(u8, &str, Position, TrackingMode)]) -> MemoryStore {
        let store = MemoryStore::with_settings(9, 3);
        let table: SlotTable = entries
            .iter()
            .map(|(n, p, pos, mode)| (slot(*n), Binding::new(*p, *pos, *mode)))
            .collect();
        store.write(&table).expect("seed");
        store
    }

    // ── Delete ───────────────────────────────────────────────────────

    #[test]
    fn delete_clears_only_affected_slot() {
        let store = seeded(&[
            (1, "a.txt", Position::default(), TrackingMode::Auto),
            (2, "b.txt", Position::new(3, 3), TrackingMode::Static),
        ]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let cleared = watcher
            .files_deleted(&[PathBuf::from("/work/proj/a.txt")])
            .expect("delete");

        assert_eq!(cleared, vec![slot(1)]);
        let table = store.read().expect("read");
        assert!(table.get(slot(1)).is_none());
        assert_eq!(
            table.get(slot(2)),
            Some(&Binding::new("b.txt", Position::new(3, 3), TrackingMode::Static))
        );
    }

    #[test]
    fn delete_batch_writes_once() {
        let store = seeded(&[
            (1, "a.txt", Position::default(), TrackingMode::Auto),
            (2, "b.txt", Position::default(), TrackingMode::Auto),
            (3, "c.txt", Position::default(), TrackingMode::Auto),
        ]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));
        let writes = store.write_count();

        let cleared = watcher
            .files_deleted(&[PathBuf::from("a.txt"), PathBuf::from("/work/proj/c.txt")])
            .expect("delete");

        assert_eq!(cleared, vec![slot(1), slot(3)]);
        assert_eq!(store.write_count(), writes + 1);

        // idempotent
        let again = watcher
            .files_deleted(&[PathBuf::from("a.txt"), PathBuf::from("/work/proj/c.txt")])
            .expect("delete again");
        assert!(again.is_empty());
        assert_eq!(store.write_count(), writes + 1);
    }

    #[test]
    fn deleting_a_directory_clears_bindings_beneath() {
        let store = seeded(&[
            (1, "src/a.rs", Position::default(), TrackingMode::Auto),
            (2, "src/deep/b.rs", Position::default(), TrackingMode::Auto),
            (3, "srcs/c.rs", Position::default(), TrackingMode::Auto),
        ]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let cleared = watcher
            .files_deleted(&[PathBuf::from("/work/proj/src")])
            .expect("delete");

        assert_eq!(cleared, vec![slot(1), slot(2)]);
        assert!(store.read().expect("read").get(slot(3)).is_some());
    }

    // ── Rename ───────────────────────────────────────────────────────

    #[test]
    fn rename_keeps_position_and_mode() {
        let store = seeded(&[(4, "a.txt", Position::new(12, 7), TrackingMode::Static)]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let report = watcher
            .files_renamed(&[(
                PathBuf::from("/work/proj/a.txt"),
                PathBuf::from("/work/proj/sub/b.txt"),
            )])
            .expect("rename");

        assert_eq!(
            report.renamed,
            vec![RenamedSlot {
                slot: slot(4),
                old_name: "a.txt".into(),
                new_name: "b.txt".into(),
                new_path: "sub/b.txt".into(),
            }]
        );
        assert_eq!(
            store.read().expect("read").get(slot(4)),
            Some(&Binding::new("sub/b.txt", Position::new(12, 7), TrackingMode::Static))
        );
    }

    #[test]
    fn renaming_a_directory_rewrites_children() {
        let store = seeded(&[
            (1, "old/a.rs", Position::default(), TrackingMode::Auto),
            (2, "old/x/b.rs", Position::default(), TrackingMode::Auto),
            (3, "keep.rs", Position::default(), TrackingMode::Auto),
        ]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let report = watcher
            .files_renamed(&[(PathBuf::from("old"), PathBuf::from("new"))])
            .expect("rename");

        assert_eq!(report.renamed.len(), 2);
        let table = store.read().expect("read");
        assert_eq!(table.get(slot(1)).map(|b| b.file_path.as_str()), Some("new/a.rs"));
        assert_eq!(table.get(slot(2)).map(|b| b.file_path.as_str()), Some("new/x/b.rs"));
        assert_eq!(table.get(slot(3)).map(|b| b.file_path.as_str()), Some("keep.rs"));
    }

    #[test]
    fn moving_out_of_workspace_clears_slot() {
        let store = seeded(&[(1, "a.txt", Position::default(), TrackingMode::Auto)]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let report = watcher
            .files_renamed(&[(PathBuf::from("/work/proj/a.txt"), PathBuf::from("/tmp/a.txt"))])
            .expect("rename");

        assert!(report.renamed.is_empty());
        assert_eq!(report.cleared, vec![slot(1)]);
        assert!(store.read().expect("read").is_empty());
    }

    #[test]
    fn rename_over_bound_file_keeps_uniqueness() {
        let store = seeded(&[
            (1, "a.txt", Position::new(1, 1), TrackingMode::Auto),
            (2, "b.txt", Position::new(2, 2), TrackingMode::Auto),
        ]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));

        let report = watcher
            .files_renamed(&[(PathBuf::from("a.txt"), PathBuf::from("b.txt"))])
            .expect("rename");

        assert_eq!(report.cleared, vec![slot(2)]);
        let table = store.read().expect("read");
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(slot(1)),
            Some(&Binding::new("b.txt", Position::new(1, 1), TrackingMode::Auto))
        );
    }

    #[test]
    fn unrelated_rename_does_not_write() {
        let store = seeded(&[(1, "a.txt", Position::default(), TrackingMode::Auto)]);
        let watcher = ConsistencyWatcher::new(&store, Path::new(ROOT));
        let writes = store.write_count();

        let report = watcher
            .files_renamed(&[(PathBuf::from("z.txt"), PathBuf::from("y.txt"))])
            .expect("rename");

        assert!(report.is_empty());
        assert_eq!(store.write_count(), writes);
    }
}
