//! `slotpin status` / `slotpin list`: read-only views of the slot table.

use std::io::Write;
use std::path::Path;

use slotpin_core::presentation::{self, SlotItem, StatusSummary};
use slotpin_core::{SlotStore, paths};

use crate::terminal::format_list;

/// Summary line, as the status indicator would render it.
pub fn status_view(
    store: &dyn SlotStore,
    root: &Path,
    active: Option<&Path>,
) -> anyhow::Result<StatusSummary> {
    let settings = store.settings()?;
    let table = store.read()?;
    let active = active.and_then(|p| paths::relative_path(root, p));
    Ok(presentation::status_summary(
        &table,
        settings.slot_count(),
        settings.status_preview_limit(),
        active.as_deref(),
    ))
}

/// One item per configured slot.
pub fn list_view(
    store: &dyn SlotStore,
    root: &Path,
    active: Option<&Path>,
) -> anyhow::Result<Vec<SlotItem>> {
    let settings = store.settings()?;
    let table = store.read()?;
    let active = active.and_then(|p| paths::relative_path(root, p));
    Ok(presentation::slot_list(
        &table,
        settings.slot_count(),
        active.as_deref(),
    ))
}

/// Entry point for `slotpin status`.
pub fn cmd_status(
    store: &dyn SlotStore,
    root: &Path,
    active: Option<&Path>,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let summary = status_view(store, root, active)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        writeln!(out, "{summary}")?;
    }
    Ok(())
}

/// Entry point for `slotpin list`.
pub fn cmd_list(
    store: &dyn SlotStore,
    root: &Path,
    active: Option<&Path>,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let items = list_view(store, root, active)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
    } else {
        for line in format_list(&items) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}
