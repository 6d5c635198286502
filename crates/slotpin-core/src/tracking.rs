//! Tracking engine: follow the cursor of `auto` bindings.
//!
//! When the host reports that a file lost focus, the slot bound to that file
//! (if any) records the cursor position at the moment of focus loss, but only
//! when its mode is `auto`. `static` bindings keep their position until they
//! are re-pinned. Tracking never changes a binding's mode.

use std::path::Path;

use crate::error::SlotError;
use crate::paths;
use crate::store::SlotStore;
use crate::types::{Position, Slot, SlotTable, TrackingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The file is not bound to any slot.
    Unbound,
    /// The slot is `static`; its position is left alone.
    Static { slot: Slot },
    /// The stored position already matched.
    Unchanged { slot: Slot },
    Updated {
        slot: Slot,
        from: Position,
        to: Position,
    },
}

impl TrackOutcome {
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Pure function: record `position` for the slot bound to `file_path`.
///
/// Returns `None` for the table when nothing changed.
pub fn apply_focus_left(
    table: &SlotTable,
    file_path: &str,
    position: Position,
) -> (Option<SlotTable>, TrackOutcome) {
    let Some((slot, binding)) = table.find_by_path(file_path) else {
        return (None, TrackOutcome::Unbound);
    };

    match binding.mode {
        TrackingMode::Static => (None, TrackOutcome::Static { slot }),
        TrackingMode::Auto if binding.position() == position => {
            (None, TrackOutcome::Unchanged { slot })
        }
        TrackingMode::Auto => {
            let from = binding.position();
            let mut next = table.clone();
            if let Some(b) = next.get_mut(slot) {
                b.set_position(position);
            }
            (
                Some(next),
                TrackOutcome::Updated {
                    slot,
                    from,
                    to: position,
                },
            )
        }
    }
}

/// Applies focus-loss events against an injected store.
pub struct Tracker<'a> {
    store: &'a dyn SlotStore,
    root: &'a Path,
}

impl<'a> Tracker<'a> {
    pub fn new(store: &'a dyn SlotStore, root: &'a Path) -> Self {
        Self { store, root }
    }

    /// Handle "`path` lost focus with the cursor at `position`".
    pub fn focus_left(&self, path: &Path, position: Position) -> Result<TrackOutcome, SlotError> {
        let Some(relative) = paths::relative_path(self.root, path) else {
            return Ok(TrackOutcome::Unbound);
        };

        let table = self.store.read()?;
        let (next, outcome) = apply_focus_left(&table, &relative, position);
        if let Some(next) = next {
            self.store.write(&next)?;
            tracing::debug!(path = %relative, ?outcome, "tracked position");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Binding;

    const ROOT: &str = "/work/proj";

    fn slot(n: u8) -> Slot {
        Slot::new(n).expect("valid slot")
    }

    fn store_with(mode: TrackingMode) -> MemoryStore {
        let store = MemoryStore::new();
        let table: SlotTable = [(slot(1), Binding::new("f.rs", Position::new(0, 0), mode))]
            .into_iter()
            .collect();
        store.write(&table).expect("seed");
        store
    }

    #[test]
    fn auto_binding_follows_cursor() {
        let store = store_with(TrackingMode::Auto);
        let tracker = Tracker::new(&store, Path::new(ROOT));

        let outcome = tracker
            .focus_left(Path::new("/work/proj/f.rs"), Position::new(10, 4))
            .expect("track");

        assert_eq!(
            outcome,
            TrackOutcome::Updated {
                slot: slot(1),
                from: Position::new(0, 0),
                to: Position::new(10, 4)
            }
        );
        let b = store.read().expect("read").get(slot(1)).cloned().expect("bound");
        assert_eq!(b.position(), Position::new(10, 4));
        assert_eq!(b.mode, TrackingMode::Auto);
    }

    #[test]
    fn static_binding_keeps_position() {
        let store = store_with(TrackingMode::Static);
        let tracker = Tracker::new(&store, Path::new(ROOT));
        let writes = store.write_count();

        let outcome = tracker
            .focus_left(Path::new("/work/proj/f.rs"), Position::new(10, 4))
            .expect("track");

        assert_eq!(outcome, TrackOutcome::Static { slot: slot(1) });
        assert_eq!(store.write_count(), writes);
        let b = store.read().expect("read").get(slot(1)).cloned().expect("bound");
        assert_eq!(b.position(), Position::new(0, 0));
    }

    #[test]
    fn unbound_and_outside_files_are_ignored() {
        let store = store_with(TrackingMode::Auto);
        let tracker = Tracker::new(&store, Path::new(ROOT));
        let writes = store.write_count();

        assert_eq!(
            tracker.focus_left(Path::new("/work/proj/other.rs"), Position::new(1, 1)),
            Ok(TrackOutcome::Unbound)
        );
        assert_eq!(
            tracker.focus_left(Path::new("/tmp/f.rs"), Position::new(1, 1)),
            Ok(TrackOutcome::Unbound)
        );
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn unchanged_position_skips_write() {
        let store = store_with(TrackingMode::Auto);
        let tracker = Tracker::new(&store, Path::new(ROOT));
        let writes = store.write_count();

        let outcome = tracker
            .focus_left(Path::new("/work/proj/f.rs"), Position::new(0, 0))
            .expect("track");
        assert_eq!(outcome, TrackOutcome::Unchanged { slot: slot(1) });
        assert!(!outcome.is_update());
        assert_eq!(store.write_count(), writes);
    }
}
