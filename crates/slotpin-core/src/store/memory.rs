//! In-memory slot store, used by tests and by embedders without a document.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::SlotError;
use crate::types::{Settings, SlotTable};

use super::{ChangeListener, Listeners, SlotDocument, SlotStore, merge_slots, migrate};

/// Slot store backed by a [`SlotDocument`] held in memory.
///
/// The raw document is kept as-is so legacy shapes survive until the first
/// write, the same way they do on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<SlotDocument>,
    unavailable: AtomicBool,
    writes: AtomicU64,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(slot_count: i64, status_preview_limit: i64) -> Self {
        Self::with_document(SlotDocument {
            slot_count: Some(slot_count),
            status_preview_limit: Some(status_preview_limit),
            ..SlotDocument::default()
        })
    }

    pub fn with_document(document: SlotDocument) -> Self {
        Self {
            document: Mutex::new(document),
            ..Self::default()
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SlotError> {
        let document: SlotDocument = serde_json::from_str(json)
            .map_err(|e| SlotError::InvalidConfiguration(e.to_string()))?;
        Ok(Self::with_document(document))
    }

    /// Serialized raw document, as it would be persisted.
    pub fn document_json(&self) -> String {
        let document = self.lock();
        serde_json::to_string(&*document).unwrap_or_default()
    }

    /// Update `slotCount` / `statusPreviewLimit` in place.
    pub fn set_settings(&self, slot_count: i64, status_preview_limit: i64) {
        let mut document = self.lock();
        document.slot_count = Some(slot_count);
        document.status_preview_limit = Some(status_preview_limit);
    }

    /// Simulate unavailable storage: every read and write fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotDocument> {
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), SlotError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(SlotError::Storage("memory store marked unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl SlotStore for MemoryStore {
    fn read(&self) -> Result<SlotTable, SlotError> {
        self.check_available()?;
        Ok(migrate(&self.lock().slots))
    }

    fn write(&self, table: &SlotTable) -> Result<(), SlotError> {
        self.check_available()?;
        {
            let mut document = self.lock();
            let merged = merge_slots(&document.slots, table);
            document.slots = merged;
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.listeners.notify(table);
        Ok(())
    }

    fn settings(&self) -> Result<Settings, SlotError> {
        self.check_available()?;
        Ok(self.lock().settings())
    }

    fn subscribe(&self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn reload(&self) -> Result<SlotTable, SlotError> {
        let table = self.read()?;
        self.listeners.notify(&table);
        Ok(table)
    }
}
