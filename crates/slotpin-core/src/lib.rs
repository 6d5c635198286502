//! slotpin-core: numbered file slots for an editor host.
//!
//! Binds up to nine project files, each with a cursor position and a
//! tracking mode, to numbered slots and keeps the bindings consistent with
//! the filesystem. Pure library: the host editor supplies the active file,
//! opens documents, shows messages, and forwards filesystem and focus events.
//!
//! - [`store`]: persisted slot document, schema migration, change listeners
//! - [`resolver`]: pin / clear / lookups, one slot per file
//! - [`tracking`]: `auto` bindings follow the cursor on focus loss
//! - [`watcher`]: delete / rename repair
//! - [`presentation`]: status summary and slot list
//! - [`commands`]: command ids, host events, and the dispatcher

pub mod commands;
pub mod error;
pub mod host;
pub mod paths;
pub mod presentation;
pub mod resolver;
pub mod store;
pub mod tracking;
pub mod types;
pub mod watcher;

pub use commands::{CommandId, Dispatcher, HostEvent};
pub use error::SlotError;
pub use host::{ActiveEditor, Host, HostError, ListChoice, MessageLevel};
pub use resolver::{ClearResult, PinResult, Resolver};
pub use store::{JsonFileStore, MemoryStore, SlotStore};
pub use types::{Binding, Position, Settings, Slot, SlotTable, TrackingMode};
