//! Project-scoped JSON document store (`<root>/.slotpin/settings.json`).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SlotError;
use crate::types::{Settings, SlotTable};

use super::{ChangeListener, Listeners, SlotDocument, SlotStore, merge_slots, migrate};

/// Directory holding the project document, relative to the workspace root.
pub const DOCUMENT_DIR: &str = ".slotpin";

/// Document file name inside [`DOCUMENT_DIR`].
pub const DOCUMENT_FILE: &str = "settings.json";

/// Slot store backed by a JSON document on disk.
///
/// The document may carry keys other than `slots`, `slotCount`, and
/// `statusPreviewLimit`; writes merge into it and leave those untouched.
/// Writes land through a temporary file and a rename, so readers never see
/// a half-written document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    last_valid: Mutex<Option<SlotTable>>,
    listeners: Listeners,
}

impl JsonFileStore {
    /// Store at the conventional location under `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::at(root.join(DOCUMENT_DIR).join(DOCUMENT_FILE))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            last_valid: Mutex::new(None),
            listeners: Listeners::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent table that loaded successfully.
    ///
    /// After the document is edited into an invalid state this is still the
    /// table from before the edit.
    pub fn last_valid(&self) -> Option<SlotTable> {
        self.last_valid
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Raw document object. A missing file is an empty object.
    fn load_object(&self) -> Result<serde_json::Map<String, serde_json::Value>, SlotError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(e) => return Err(SlotError::Storage(format!("{}: {e}", self.path.display()))),
        };

        if content.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }

        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            SlotError::InvalidConfiguration(format!("{}: {e}", self.path.display()))
        })?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(SlotError::InvalidConfiguration(format!(
                "{}: document is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn load_document(&self) -> Result<SlotDocument, SlotError> {
        let object = self.load_object()?;
        parse_document(&self.path, object)
    }

    fn remember(&self, table: &SlotTable) {
        *self.last_valid.lock().unwrap_or_else(|e| e.into_inner()) = Some(table.clone());
    }

    fn persist(&self, object: serde_json::Map<String, serde_json::Value>) -> Result<(), SlotError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let output = serde_json::to_string_pretty(&serde_json::Value::Object(object))
            .map_err(|e| SlotError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, format!("{output}\n"))?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn parse_document(
    path: &Path,
    object: serde_json::Map<String, serde_json::Value>,
) -> Result<SlotDocument, SlotError> {
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| SlotError::InvalidConfiguration(format!("{}: {e}", path.display())))
}

impl SlotStore for JsonFileStore {
    fn read(&self) -> Result<SlotTable, SlotError> {
        let table = migrate(&self.load_document()?.slots);
        self.remember(&table);
        Ok(table)
    }

    fn write(&self, table: &SlotTable) -> Result<(), SlotError> {
        // Refuse to replace a document the user left in an invalid state.
        let mut object = self.load_object()?;
        let previous = parse_document(&self.path, object.clone())?;

        let slots = serde_json::to_value(merge_slots(&previous.slots, table))
            .map_err(|e| SlotError::Storage(e.to_string()))?;
        object.insert("slots".to_string(), slots);
        self.persist(object)?;

        tracing::debug!(path = %self.path.display(), slots = table.len(), "slot table written");
        self.remember(table);
        self.listeners.notify(table);
        Ok(())
    }

    fn settings(&self) -> Result<Settings, SlotError> {
        Ok(self.load_document()?.settings())
    }

    fn subscribe(&self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn reload(&self) -> Result<SlotTable, SlotError> {
        match self.load_document() {
            Ok(document) => {
                let table = migrate(&document.slots);
                self.remember(&table);
                self.listeners.notify(&table);
                Ok(table)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected slot document change, keeping previous slots");
                Err(e)
            }
        }
    }
}
