use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SlotError;

/// Highest slot number a host can bind.
pub const MAX_SLOTS: u8 = 9;

/// Slot count used when the document does not set `slotCount`.
pub const DEFAULT_SLOT_COUNT: u8 = 3;

/// Preview limit used when the document does not set `statusPreviewLimit`.
pub const DEFAULT_STATUS_PREVIEW_LIMIT: u8 = 3;

// ─── Slot ─────────────────────────────────────────────────────────

/// A slot number in `1..=MAX_SLOTS`.
///
/// Whether a slot is usable also depends on the configured slot count;
/// see [`Settings::is_enabled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

impl Slot {
    pub fn new(n: u8) -> Option<Self> {
        (1..=MAX_SLOTS).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every slot number, enabled or not.
    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=MAX_SLOTS).map(Slot)
    }

    /// The first `count` slots (clamped to `MAX_SLOTS`).
    pub fn first(count: u8) -> impl Iterator<Item = Slot> {
        (1..=count.min(MAX_SLOTS)).map(Slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Slot {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Slot::new)
            .ok_or_else(|| SlotError::InvalidSlot(s.to_string()))
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Position & Mode ──────────────────────────────────────────────

/// Zero-based cursor coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Renders 1-based `line:column`, the way editors show a cursor.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            u64::from(self.line) + 1,
            u64::from(self.character) + 1
        )
    }
}

/// How a binding's position reacts to navigation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Position follows the cursor whenever the user leaves the file.
    #[default]
    Auto,
    /// Position changes only on an explicit re-pin.
    Static,
}

impl TrackingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Static => "static",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Auto => Self::Static,
            Self::Static => Self::Auto,
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingMode {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "static" => Ok(Self::Static),
            _ => Err(SlotError::InvalidConfiguration(format!(
                "unknown tracking mode: {s}"
            ))),
        }
    }
}

// ─── Binding ──────────────────────────────────────────────────────

/// One slot's content: a workspace-relative file, a cursor, and a mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Forward-slash separated path relative to the workspace root.
    pub file_path: String,
    pub line: u32,
    pub character: u32,
    pub mode: TrackingMode,
}

impl Binding {
    pub fn new(file_path: impl Into<String>, position: Position, mode: TrackingMode) -> Self {
        Self {
            file_path: file_path.into(),
            line: position.line,
            character: position.character,
            mode,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    pub fn set_position(&mut self, position: Position) {
        self.line = position.line;
        self.character = position.character;
    }

    /// Last path segment, used in messages and status text.
    pub fn file_name(&self) -> &str {
        crate::paths::file_name(&self.file_path)
    }
}

// ─── Slot Table ───────────────────────────────────────────────────

/// Mapping from slot to binding. A missing key means the slot is empty.
///
/// The table may hold bindings for slots above the configured slot count;
/// those are kept but treated as inert by every command.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotTable {
    slots: BTreeMap<Slot, Binding>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&Binding> {
        self.slots.get(&slot)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Binding> {
        self.slots.get_mut(&slot)
    }

    /// Insert a binding, returning whatever the slot held before.
    pub fn insert(&mut self, slot: Slot, binding: Binding) -> Option<Binding> {
        self.slots.insert(slot, binding)
    }

    pub fn remove(&mut self, slot: Slot) -> Option<Binding> {
        self.slots.remove(&slot)
    }

    /// Linear scan for the slot holding `file_path`.
    pub fn find_by_path(&self, file_path: &str) -> Option<(Slot, &Binding)> {
        self.slots
            .iter()
            .find(|(_, b)| b.file_path == file_path)
            .map(|(s, b)| (*s, b))
    }

    /// Bindings in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Binding)> {
        self.slots.iter().map(|(s, b)| (*s, b))
    }

    /// Bindings whose slot is within the first `slot_count` slots.
    pub fn enabled(&self, slot_count: u8) -> impl Iterator<Item = (Slot, &Binding)> {
        self.iter().filter(move |(s, _)| s.get() <= slot_count)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<(Slot, Binding)> for SlotTable {
    fn from_iter<I: IntoIterator<Item = (Slot, Binding)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

// ─── Settings ─────────────────────────────────────────────────────

/// `slotCount` and `statusPreviewLimit`, already clamped to valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    slot_count: u8,
    status_preview_limit: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT, DEFAULT_STATUS_PREVIEW_LIMIT)
    }
}

impl Settings {
    /// Build settings, clamping `slot_count` to `1..=MAX_SLOTS` and the
    /// preview limit to `1..=slot_count`.
    pub fn new(slot_count: u8, status_preview_limit: u8) -> Self {
        let slot_count = slot_count.clamp(1, MAX_SLOTS);
        Self {
            slot_count,
            status_preview_limit: status_preview_limit.clamp(1, slot_count),
        }
    }

    /// Build settings from raw document values, logging anything out of range.
    pub fn from_raw(slot_count: Option<i64>, status_preview_limit: Option<i64>) -> Self {
        let slot_count = clamp_raw("slotCount", slot_count, DEFAULT_SLOT_COUNT, MAX_SLOTS);
        let preview = clamp_raw(
            "statusPreviewLimit",
            status_preview_limit,
            DEFAULT_STATUS_PREVIEW_LIMIT,
            u8::MAX,
        );
        Self::new(slot_count, preview)
    }

    pub fn slot_count(&self) -> u8 {
        self.slot_count
    }

    pub fn status_preview_limit(&self) -> u8 {
        self.status_preview_limit
    }

    pub fn is_enabled(&self, slot: Slot) -> bool {
        slot.get() <= self.slot_count
    }
}

fn clamp_raw(key: &str, raw: Option<i64>, default: u8, max: u8) -> u8 {
    let Some(value) = raw else {
        return default;
    };
    let clamped = value.clamp(1, i64::from(max));
    if clamped != value {
        tracing::warn!(key, value, clamped, "setting out of range, clamping");
    }
    u8::try_from(clamped).unwrap_or(default)
}
