//! Binding resolver: pin, clear, lookups, and mode changes.
//!
//! Enforces the slot invariants on every mutation:
//!
//! - a slot above the configured slot count is inert (`SlotDisabled`)
//! - a file is bound to at most one slot; pinning a bound file to another
//!   slot moves it
//! - stored paths are workspace-relative (`OutOfWorkspace` otherwise)
//!
//! Every operation reads a fresh table from the store and writes a complete
//! replacement, so concurrent handlers see either the old or the new table.

use std::path::{Path, PathBuf};

use crate::error::SlotError;
use crate::paths;
use crate::store::SlotStore;
use crate::types::{Binding, Position, Settings, Slot, SlotTable, TrackingMode};

// ─── Results ──────────────────────────────────────────────────────

/// What a pin did, so the caller can word its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinResult {
    /// The slot was empty.
    Bound { slot: Slot, file_name: String },
    /// The slot held a different file, which was replaced.
    Rebound {
        slot: Slot,
        file_name: String,
        previous_file_name: String,
    },
    /// The file was bound to another slot and moved, keeping its mode.
    Moved {
        from: Slot,
        to: Slot,
        file_name: String,
        /// File that previously occupied the target slot.
        displaced: Option<String>,
    },
    /// The file was re-pinned to its own slot; only the position changed.
    Updated { slot: Slot, file_name: String },
}

impl PinResult {
    /// Slot now holding the file.
    pub fn slot(&self) -> Slot {
        match self {
            Self::Bound { slot, .. } | Self::Rebound { slot, .. } | Self::Updated { slot, .. } => {
                *slot
            }
            Self::Moved { to, .. } => *to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearResult {
    Cleared { slot: Slot, file_name: String },
    /// Nothing to clear. Informational; the table is not written.
    AlreadyEmpty { slot: Slot },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub slot: Slot,
    pub file_name: String,
    pub mode: TrackingMode,
    pub changed: bool,
}

/// Where a jump should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTarget {
    pub slot: Slot,
    pub path: PathBuf,
    pub binding: Binding,
}

/// Fail with `SlotDisabled` when `slot` is above the configured count.
pub fn ensure_enabled(slot: Slot, settings: &Settings) -> Result<(), SlotError> {
    if settings.is_enabled(slot) {
        Ok(())
    } else {
        Err(SlotError::SlotDisabled {
            slot,
            slot_count: settings.slot_count(),
        })
    }
}

// ─── Pure Pin ─────────────────────────────────────────────────────

/// Pure function: bind `file_path` at `position` to `slot` in `table`.
///
/// Returns the new table and what happened. The input is not mutated.
pub fn apply_pin(
    table: &SlotTable,
    slot: Slot,
    file_path: &str,
    position: Position,
) -> (SlotTable, PinResult) {
    let mut next = table.clone();
    let file_name = paths::file_name(file_path).to_string();
    let existing = table.find_by_path(file_path).map(|(s, b)| (s, b.mode));
    let previous = table.get(slot).map(|b| b.file_name().to_string());

    let result = match existing {
        Some((from, mode)) if from == slot => {
            next.insert(slot, Binding::new(file_path, position, mode));
            PinResult::Updated { slot, file_name }
        }
        Some((from, mode)) => {
            next.remove(from);
            next.insert(slot, Binding::new(file_path, position, mode));
            PinResult::Moved {
                from,
                to: slot,
                file_name,
                displaced: previous,
            }
        }
        None => {
            next.insert(slot, Binding::new(file_path, position, TrackingMode::Auto));
            match previous {
                Some(previous_file_name) => PinResult::Rebound {
                    slot,
                    file_name,
                    previous_file_name,
                },
                None => PinResult::Bound { slot, file_name },
            }
        }
    };

    (next, result)
}

// ─── Resolver ─────────────────────────────────────────────────────

/// Slot operations against an injected store and workspace root.
pub struct Resolver<'a> {
    store: &'a dyn SlotStore,
    root: &'a Path,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn SlotStore, root: &'a Path) -> Self {
        Self { store, root }
    }

    /// Bind `path` at `position` to `slot`.
    pub fn pin(&self, slot: Slot, path: &Path, position: Position) -> Result<PinResult, SlotError> {
        let settings = self.store.settings()?;
        ensure_enabled(slot, &settings)?;

        let relative = paths::relative_path(self.root, path).ok_or_else(|| {
            SlotError::OutOfWorkspace {
                path: path.display().to_string(),
            }
        })?;

        let table = self.store.read()?;
        let (next, result) = apply_pin(&table, slot, &relative, position);
        self.store.write(&next)?;

        tracing::info!(slot = result.slot().get(), path = %relative, ?result, "pinned");
        Ok(result)
    }

    /// Empty `slot`.
    pub fn clear(&self, slot: Slot) -> Result<ClearResult, SlotError> {
        let settings = self.store.settings()?;
        ensure_enabled(slot, &settings)?;

        let mut table = self.store.read()?;
        let Some(removed) = table.remove(slot) else {
            return Ok(ClearResult::AlreadyEmpty { slot });
        };
        self.store.write(&table)?;

        tracing::info!(slot = slot.get(), path = %removed.file_path, "cleared");
        Ok(ClearResult::Cleared {
            slot,
            file_name: removed.file_name().to_string(),
        })
    }

    /// Binding in `slot`, read fresh from the store.
    pub fn find_by_slot(&self, slot: Slot) -> Result<Option<Binding>, SlotError> {
        Ok(self.store.read()?.get(slot).cloned())
    }

    /// Slot holding `path`, read fresh from the store. Files outside the
    /// workspace are never bound.
    pub fn find_by_path(&self, path: &Path) -> Result<Option<(Slot, Binding)>, SlotError> {
        let Some(relative) = paths::relative_path(self.root, path) else {
            return Ok(None);
        };
        Ok(self
            .store
            .read()?
            .find_by_path(&relative)
            .map(|(s, b)| (s, b.clone())))
    }

    /// Set the tracking mode of a bound slot. `None` toggles it.
    pub fn set_mode(&self, slot: Slot, mode: Option<TrackingMode>) -> Result<ModeChange, SlotError> {
        let settings = self.store.settings()?;
        ensure_enabled(slot, &settings)?;

        let mut table = self.store.read()?;
        let binding = table.get_mut(slot).ok_or(SlotError::SlotEmpty { slot })?;
        let target = mode.unwrap_or_else(|| binding.mode.toggled());
        let changed = binding.mode != target;
        binding.mode = target;
        let file_name = binding.file_name().to_string();

        if changed {
            self.store.write(&table)?;
            tracing::info!(slot = slot.get(), mode = %target, "tracking mode changed");
        }

        Ok(ModeChange {
            slot,
            file_name,
            mode: target,
            changed,
        })
    }

    /// Absolute path and stored binding for a jump to `slot`.
    pub fn jump_target(&self, slot: Slot) -> Result<JumpTarget, SlotError> {
        let settings = self.store.settings()?;
        ensure_enabled(slot, &settings)?;

        let binding = self
            .find_by_slot(slot)?
            .ok_or(SlotError::SlotEmpty { slot })?;

        Ok(JumpTarget {
            slot,
            path: paths::resolve(self.root, &binding.file_path),
            binding,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────
