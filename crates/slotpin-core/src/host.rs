//! Host boundary: what the embedding editor provides to the slot core.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::presentation::{SlotAction, SlotItem};
use crate::types::{Position, Slot};

/// The focused file and its cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEditor {
    pub path: PathBuf,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// What the user picked from the slot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChoice {
    pub slot: Slot,
    /// `None` means the item itself was selected rather than one of its buttons.
    pub action: Option<SlotAction>,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot open {}: {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },

    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
}

/// Services the host editor offers.
///
/// Implementations are called from a single event handler at a time.
pub trait Host {
    /// Focused file and cursor, if any.
    fn active_editor(&self) -> Option<ActiveEditor>;

    /// Project root all slot paths are relative to.
    fn workspace_root(&self) -> Option<PathBuf>;

    /// Open `path` and reveal the zero-based `position`.
    fn open_at(&self, path: &Path, position: Position) -> Result<(), HostError>;

    /// Modal yes/no question. `false` when dismissed.
    fn confirm(&self, prompt: &str) -> bool;

    fn show_message(&self, level: MessageLevel, message: &str);

    /// Present the slot list and wait for a choice. `None` when dismissed.
    fn choose_slot(&self, items: &[SlotItem]) -> Option<ListChoice>;

    /// Open the host's keybinding editor filtered to `filter`.
    fn open_keybindings(&self, filter: &str) -> Result<(), HostError>;
}
