//! Presentation: status summary and the selectable slot list.
//!
//! Everything here is derived from a table snapshot; nothing is stored.

use std::fmt;

use serde::Serialize;

use crate::types::{Slot, SlotTable, TrackingMode};

/// Separator between entries in the one-line summary.
pub const STATUS_SEPARATOR: &str = " \u{00b7} ";

// ─── Status Summary ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub slot: Slot,
    pub file_name: String,
    /// The slot holds the currently active file.
    pub active: bool,
}

impl StatusEntry {
    pub fn label(&self) -> String {
        if self.active {
            format!("[{} {}]", self.slot, self.file_name)
        } else {
            format!("{} {}", self.slot, self.file_name)
        }
    }
}

/// Compact status indicator: the first bound slots plus an overflow count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub entries: Vec<StatusEntry>,
    /// Bound slots that did not fit in the preview.
    pub overflow: usize,
}

impl StatusSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.overflow == 0
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(StatusEntry::label).collect()
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("slots: empty");
        }
        f.write_str(&self.labels().join(STATUS_SEPARATOR))?;
        if self.overflow > 0 {
            write!(f, " +{}", self.overflow)?;
        }
        Ok(())
    }
}

/// Build the status summary.
///
/// Only slots within `slot_count` are shown. `preview_limit` is clamped to
/// `[1, slot_count]`. `active_file` is the workspace-relative path of the
/// focused file, if any.
pub fn status_summary(
    table: &SlotTable,
    slot_count: u8,
    preview_limit: u8,
    active_file: Option<&str>,
) -> StatusSummary {
    let limit = usize::from(preview_limit.clamp(1, slot_count.max(1)));
    let bound: Vec<StatusEntry> = table
        .enabled(slot_count)
        .map(|(slot, b)| StatusEntry {
            slot,
            file_name: b.file_name().to_string(),
            active: active_file == Some(b.file_path.as_str()),
        })
        .collect();

    let overflow = bound.len().saturating_sub(limit);
    let entries = bound.into_iter().take(limit).collect();
    StatusSummary { entries, overflow }
}

// ─── Slot List ────────────────────────────────────────────────────

/// Buttons offered on a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAction {
    /// Pin the active file to this slot.
    Rebind,
    Clear,
    ToggleMode,
}

impl SlotAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rebind => "Pin active file here",
            Self::Clear => "Clear slot",
            Self::ToggleMode => "Toggle tracking mode",
        }
    }
}

/// What selecting an item (not one of its buttons) means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectIntent {
    Jump(Slot),
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotItem {
    pub slot: Slot,
    pub label: String,
    pub description: String,
    pub bound: bool,
    pub active: bool,
    pub mode: Option<TrackingMode>,
    pub actions: Vec<SlotAction>,
}

impl SlotItem {
    pub fn on_select(&self) -> SelectIntent {
        if self.bound {
            SelectIntent::Jump(self.slot)
        } else {
            SelectIntent::Nothing
        }
    }
}

/// One item per configured slot, bound or empty, in slot order.
pub fn slot_list(table: &SlotTable, slot_count: u8, active_file: Option<&str>) -> Vec<SlotItem> {
    Slot::first(slot_count)
        .map(|slot| match table.get(slot) {
            Some(b) => {
                let active = active_file == Some(b.file_path.as_str());
                let marker = if active { "\u{25cf} " } else { "" };
                SlotItem {
                    slot,
                    label: format!("{marker}{slot}: {}", b.file_name()),
                    description: format!("{}:{} ({})", b.file_path, b.position(), b.mode),
                    bound: true,
                    active,
                    mode: Some(b.mode),
                    actions: vec![SlotAction::Rebind, SlotAction::ToggleMode, SlotAction::Clear],
                }
            }
            None => SlotItem {
                slot,
                label: format!("{slot}: (empty)"),
                description: "pin the active file to fill this slot".to_string(),
                bound: false,
                active: false,
                mode: None,
                actions: vec![SlotAction::Rebind],
            },
        })
        .collect()
}
