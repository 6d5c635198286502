//! Error types for slot operations.

use thiserror::Error;

use crate::host::MessageLevel;
use crate::types::Slot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("no active file to pin")]
    NoActiveFile,

    #[error("no workspace folder is open")]
    NoWorkspace,

    #[error("{path} is outside the workspace")]
    OutOfWorkspace { path: String },

    #[error("slot {slot} is disabled (slot count is {slot_count})")]
    SlotDisabled { slot: Slot, slot_count: u8 },

    #[error("slot {slot} is empty")]
    SlotEmpty { slot: Slot },

    #[error("cannot open {path} from slot {slot}")]
    FileUnavailable { slot: Slot, path: String },

    #[error("slot storage unavailable: {0}")]
    Storage(String),

    #[error("invalid slot configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid slot number: {0:?}")]
    InvalidSlot(String),
}

impl SlotError {
    /// Severity used when the error is reported to the user.
    pub fn level(&self) -> MessageLevel {
        match self {
            Self::SlotEmpty { .. } => MessageLevel::Info,
            Self::Storage(_) | Self::InvalidConfiguration(_) => MessageLevel::Error,
            Self::NoActiveFile
            | Self::NoWorkspace
            | Self::OutOfWorkspace { .. }
            | Self::SlotDisabled { .. }
            | Self::FileUnavailable { .. }
            | Self::InvalidSlot(_) => MessageLevel::Warning,
        }
    }
}

impl From<std::io::Error> for SlotError {
    fn from(e: std::io::Error) -> Self {
        SlotError::Storage(e.to_string())
    }
}
