//! Command surface and event dispatch.
//!
//! [`Dispatcher::handle`] is the boundary of every triggering operation: it
//! runs one [`HostEvent`] to completion and turns the outcome, success or
//! failure, into at most one message through the [`Host`]. Nothing escapes
//! to the caller except the error value itself, which the caller may use to
//! pick an exit status.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SlotError;
use crate::host::{Host, MessageLevel};
use crate::paths;
use crate::presentation::{self, SelectIntent, SlotAction, StatusSummary};
use crate::resolver::{ClearResult, ModeChange, PinResult, Resolver, ensure_enabled};
use crate::store::SlotStore;
use crate::tracking::Tracker;
use crate::types::{Position, Slot, TrackingMode};
use crate::watcher::{ConsistencyWatcher, RenameReport};

/// Namespace for command ids registered with the host.
pub const COMMAND_NAMESPACE: &str = "slotpin";

// ─── Command Ids ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    PinToSlot(Slot),
    JumpToSlot(Slot),
    ClearSlot(Slot),
    SetSlotMode(Slot),
    ShowStatus,
    ConfigureKeybindings,
}

impl CommandId {
    /// Every command the host should register, slot commands for all nine
    /// slots. Commands beyond the configured slot count stay registered but
    /// are rejected when run.
    pub fn all() -> Vec<CommandId> {
        let mut ids = Vec::new();
        for slot in Slot::all() {
            ids.push(Self::PinToSlot(slot));
            ids.push(Self::JumpToSlot(slot));
            ids.push(Self::ClearSlot(slot));
            ids.push(Self::SetSlotMode(slot));
        }
        ids.push(Self::ShowStatus);
        ids.push(Self::ConfigureKeybindings);
        ids
    }

    /// Fully qualified id, e.g. `slotpin.jumpToSlot3`.
    pub fn qualified(&self) -> String {
        format!("{COMMAND_NAMESPACE}.{self}")
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            Self::PinToSlot(s) | Self::JumpToSlot(s) | Self::ClearSlot(s) | Self::SetSlotMode(s) => {
                Some(*s)
            }
            Self::ShowStatus | Self::ConfigureKeybindings => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::PinToSlot(s) => format!("Pin to Slot {s}"),
            Self::JumpToSlot(s) => format!("Jump to Slot {s}"),
            Self::ClearSlot(s) => format!("Clear Slot {s}"),
            Self::SetSlotMode(s) => format!("Toggle Tracking Mode of Slot {s}"),
            Self::ShowStatus => "Show Slots".to_string(),
            Self::ConfigureKeybindings => "Configure Slot Keybindings".to_string(),
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinToSlot(s) => write!(f, "pinToSlot{s}"),
            Self::JumpToSlot(s) => write!(f, "jumpToSlot{s}"),
            Self::ClearSlot(s) => write!(f, "clearSlot{s}"),
            Self::SetSlotMode(s) => write!(f, "setSlotMode{s}"),
            Self::ShowStatus => f.write_str("showStatus"),
            Self::ConfigureKeybindings => f.write_str("configureKeybindings"),
        }
    }
}

impl FromStr for CommandId {
    type Err = SlotError;

    /// Accepts bare (`pinToSlot2`) and qualified (`slotpin.pinToSlot2`) ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s
            .strip_prefix(COMMAND_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(s);

        match bare {
            "showStatus" => return Ok(Self::ShowStatus),
            "configureKeybindings" => return Ok(Self::ConfigureKeybindings),
            _ => {}
        }

        let slot_commands: [(&str, fn(Slot) -> CommandId); 4] = [
            ("pinToSlot", Self::PinToSlot),
            ("jumpToSlot", Self::JumpToSlot),
            ("clearSlot", Self::ClearSlot),
            ("setSlotMode", Self::SetSlotMode),
        ];
        for (prefix, make) in slot_commands {
            if let Some(n) = bare.strip_prefix(prefix) {
                return Ok(make(n.parse()?));
            }
        }

        Err(SlotError::InvalidConfiguration(format!("unknown command: {s}")))
    }
}

// ─── Events ───────────────────────────────────────────────────────

/// Everything the host can deliver to the slot core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Command(CommandId),
    /// Set an explicit tracking mode, where `setSlotMode<N>` only toggles.
    SetMode { slot: Slot, mode: TrackingMode },
    /// The previously focused file lost focus with the cursor at `position`.
    FocusLeft { path: PathBuf, position: Position },
    FilesDeleted(Vec<PathBuf>),
    /// `(old, new)` pairs.
    FilesRenamed(Vec<(PathBuf, PathBuf)>),
    /// The persisted document changed outside this process.
    ConfigurationChanged,
}

// ─── Messages ─────────────────────────────────────────────────────

pub fn pin_message(result: &PinResult) -> String {
    match result {
        PinResult::Bound { slot, file_name } => format!("Pinned {file_name} to slot {slot}"),
        PinResult::Rebound {
            slot,
            file_name,
            previous_file_name,
        } => format!("Pinned {file_name} to slot {slot} (replaced {previous_file_name})"),
        PinResult::Moved {
            from,
            to,
            file_name,
            displaced: None,
        } => format!("Moved {file_name} from slot {from} to slot {to}"),
        PinResult::Moved {
            from,
            to,
            file_name,
            displaced: Some(displaced),
        } => format!("Moved {file_name} from slot {from} to slot {to} (replaced {displaced})"),
        PinResult::Updated { slot, file_name } => {
            format!("Updated slot {slot} position for {file_name}")
        }
    }
}

pub fn clear_message(result: &ClearResult) -> String {
    match result {
        ClearResult::Cleared { slot, file_name } => format!("Cleared slot {slot} ({file_name})"),
        ClearResult::AlreadyEmpty { slot } => format!("Slot {slot} is already empty"),
    }
}

pub fn mode_message(change: &ModeChange) -> String {
    if !change.changed {
        return format!(
            "Slot {} ({}) is already {}",
            change.slot, change.file_name, change.mode
        );
    }
    match change.mode {
        TrackingMode::Auto => format!(
            "Slot {} ({}) now follows the cursor",
            change.slot, change.file_name
        ),
        TrackingMode::Static => format!(
            "Slot {} ({}) now keeps a fixed position",
            change.slot, change.file_name
        ),
    }
}

pub fn deleted_message(cleared: &[Slot]) -> Option<String> {
    match cleared {
        [] => None,
        [slot] => Some(format!("Slot {slot} cleared because its file was deleted")),
        many => Some(format!(
            "Slots {} cleared because their files were deleted",
            join_slots(many)
        )),
    }
}

pub fn renamed_message(report: &RenameReport) -> Option<String> {
    let mut parts: Vec<String> = report
        .renamed
        .iter()
        .map(|r| format!("Slot {} now points to {} (was {})", r.slot, r.new_name, r.old_name))
        .collect();
    match report.cleared.as_slice() {
        [] => {}
        [slot] => parts.push(format!("slot {slot} cleared")),
        many => parts.push(format!("slots {} cleared", join_slots(many))),
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn join_slots(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(Slot::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Dispatcher ───────────────────────────────────────────────────

/// Runs host events against the store.
pub struct Dispatcher<'a> {
    store: &'a dyn SlotStore,
    host: &'a dyn Host,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a dyn SlotStore, host: &'a dyn Host) -> Self {
        Self { store, host }
    }

    /// Run one event to completion.
    ///
    /// Every failure has already been shown to the user when this returns
    /// `Err`.
    pub fn handle(&self, event: HostEvent) -> Result<(), SlotError> {
        tracing::debug!(?event, "handling event");
        let result = match event {
            HostEvent::Command(CommandId::PinToSlot(slot)) => self.pin_active(slot),
            HostEvent::Command(CommandId::JumpToSlot(slot)) => self.jump(slot),
            HostEvent::Command(CommandId::ClearSlot(slot)) => self.clear(slot),
            HostEvent::Command(CommandId::SetSlotMode(slot)) => self.set_mode(slot, None),
            HostEvent::Command(CommandId::ShowStatus) => self.show_status(),
            HostEvent::Command(CommandId::ConfigureKeybindings) => self.configure_keybindings(),
            HostEvent::SetMode { slot, mode } => self.set_mode(slot, Some(mode)),
            HostEvent::FocusLeft { path, position } => self.focus_left(&path, position),
            HostEvent::FilesDeleted(paths) => self.files_deleted(&paths),
            HostEvent::FilesRenamed(renames) => self.files_renamed(&renames),
            HostEvent::ConfigurationChanged => self.configuration_changed(),
        };

        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    /// Pin the active file at its cursor to `slot`.
    pub fn pin_active(&self, slot: Slot) -> Result<(), SlotError> {
        let root = self.root()?;
        ensure_enabled(slot, &self.store.settings()?)?;
        let active = self.host.active_editor().ok_or(SlotError::NoActiveFile)?;
        let result = Resolver::new(self.store, &root).pin(slot, &active.path, active.position)?;
        self.host.show_message(MessageLevel::Info, &pin_message(&result));
        Ok(())
    }

    /// Open the file in `slot` at its stored position.
    ///
    /// When the file cannot be opened the user is offered to clear the slot;
    /// declining leaves it untouched.
    pub fn jump(&self, slot: Slot) -> Result<(), SlotError> {
        let root = self.root()?;
        let resolver = Resolver::new(self.store, &root);
        let target = resolver.jump_target(slot)?;
        let position = target.binding.position();

        match self.host.open_at(&target.path, position) {
            Ok(()) => {
                tracing::debug!(slot = slot.get(), path = %target.binding.file_path, %position, "jumped");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(slot = slot.get(), error = %e, "jump target unavailable");
                let prompt = format!(
                    "{} in slot {slot} could not be opened. Clear slot {slot}?",
                    target.binding.file_path
                );
                if self.host.confirm(&prompt) {
                    let cleared = resolver.clear(slot)?;
                    self.host
                        .show_message(MessageLevel::Info, &clear_message(&cleared));
                    Ok(())
                } else {
                    Err(SlotError::FileUnavailable {
                        slot,
                        path: target.binding.file_path,
                    })
                }
            }
        }
    }

    pub fn clear(&self, slot: Slot) -> Result<(), SlotError> {
        let root = self.root()?;
        let result = Resolver::new(self.store, &root).clear(slot)?;
        self.host.show_message(MessageLevel::Info, &clear_message(&result));
        Ok(())
    }

    /// Set or toggle (`None`) the tracking mode of `slot`.
    pub fn set_mode(&self, slot: Slot, mode: Option<TrackingMode>) -> Result<(), SlotError> {
        let root = self.root()?;
        let change = Resolver::new(self.store, &root).set_mode(slot, mode)?;
        self.host.show_message(MessageLevel::Info, &mode_message(&change));
        Ok(())
    }

    /// Present the slot list and act on the choice.
    pub fn show_status(&self) -> Result<(), SlotError> {
        let settings = self.store.settings()?;
        let table = self.store.read()?;
        let active = self.active_relative();
        let items = presentation::slot_list(&table, settings.slot_count(), active.as_deref());

        let Some(choice) = self.host.choose_slot(&items) else {
            return Ok(());
        };
        let Some(item) = items.iter().find(|i| i.slot == choice.slot) else {
            return Ok(());
        };

        match choice.action {
            None => match item.on_select() {
                SelectIntent::Jump(slot) => self.jump(slot),
                SelectIntent::Nothing => Ok(()),
            },
            Some(SlotAction::Rebind) => self.pin_active(choice.slot),
            Some(SlotAction::Clear) => self.clear(choice.slot),
            Some(SlotAction::ToggleMode) => self.set_mode(choice.slot, None),
        }
    }

    pub fn configure_keybindings(&self) -> Result<(), SlotError> {
        if let Err(e) = self.host.open_keybindings(COMMAND_NAMESPACE) {
            self.host
                .show_message(MessageLevel::Warning, &format!("Cannot open keybindings: {e}"));
        }
        Ok(())
    }

    /// Current one-line status, for hosts that render it on every change.
    pub fn status_summary(&self) -> Result<StatusSummary, SlotError> {
        let settings = self.store.settings()?;
        let table = self.store.read()?;
        let active = self.active_relative();
        Ok(presentation::status_summary(
            &table,
            settings.slot_count(),
            settings.status_preview_limit(),
            active.as_deref(),
        ))
    }

    fn focus_left(&self, path: &Path, position: Position) -> Result<(), SlotError> {
        let root = self.root()?;
        Tracker::new(self.store, &root).focus_left(path, position)?;
        Ok(())
    }

    fn files_deleted(&self, deleted: &[PathBuf]) -> Result<(), SlotError> {
        let root = self.root()?;
        let cleared = ConsistencyWatcher::new(self.store, &root).files_deleted(deleted)?;
        if let Some(message) = deleted_message(&cleared) {
            self.host.show_message(MessageLevel::Info, &message);
        }
        Ok(())
    }

    fn files_renamed(&self, renames: &[(PathBuf, PathBuf)]) -> Result<(), SlotError> {
        let root = self.root()?;
        let report = ConsistencyWatcher::new(self.store, &root).files_renamed(renames)?;
        if let Some(message) = renamed_message(&report) {
            self.host.show_message(MessageLevel::Info, &message);
        }
        Ok(())
    }

    fn configuration_changed(&self) -> Result<(), SlotError> {
        self.store.reload()?;
        Ok(())
    }

    fn root(&self) -> Result<PathBuf, SlotError> {
        self.host.workspace_root().ok_or(SlotError::NoWorkspace)
    }

    fn active_relative(&self) -> Option<String> {
        let root = self.host.workspace_root()?;
        let active = self.host.active_editor()?;
        paths::relative_path(&root, &active.path)
    }

    fn report(&self, error: &SlotError) {
        let message = match error {
            SlotError::InvalidConfiguration(detail) => {
                format!("Slot configuration rejected, keeping previous slots: {detail}")
            }
            // The confirm prompt already told the user.
            SlotError::FileUnavailable { .. } => return,
            other => {
                let text = other.to_string();
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => text,
                }
            }
        };
        self.host.show_message(error.level(), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_round_trip_through_text() {
        for id in CommandId::all() {
            assert_eq!(id.to_string().parse::<CommandId>().ok(), Some(id));
            assert_eq!(id.qualified().parse::<CommandId>().ok(), Some(id));
        }
        assert_eq!(CommandId::all().len(), 9 * 4 + 2);
    }

    #[test]
    fn command_id_parsing_rejects_bad_slots() {
        assert!("pinToSlot0".parse::<CommandId>().is_err());
        assert!("jumpToSlot10".parse::<CommandId>().is_err());
        assert!("explode".parse::<CommandId>().is_err());
        assert_eq!(
            "slotpin.jumpToSlot3".parse::<CommandId>().ok(),
            Slot::new(3).map(CommandId::JumpToSlot)
        );
    }

    #[test]
    fn delete_message_wording() {
        let s = |n| Slot::new(n).expect("slot");
        assert_eq!(deleted_message(&[]), None);
        assert_eq!(
            deleted_message(&[s(2)]).as_deref(),
            Some("Slot 2 cleared because its file was deleted")
        );
        assert_eq!(
            deleted_message(&[s(1), s(3)]).as_deref(),
            Some("Slots 1, 3 cleared because their files were deleted")
        );
    }

    #[test]
    fn pin_message_wording() {
        let s = |n| Slot::new(n).expect("slot");
        assert_eq!(
            pin_message(&PinResult::Moved {
                from: s(1),
                to: s(2),
                file_name: "a.rs".into(),
                displaced: None
            }),
            "Moved a.rs from slot 1 to slot 2"
        );
        assert_eq!(
            pin_message(&PinResult::Rebound {
                slot: s(3),
                file_name: "b.rs".into(),
                previous_file_name: "a.rs".into()
            }),
            "Pinned b.rs to slot 3 (replaced a.rs)"
        );
    }
}
