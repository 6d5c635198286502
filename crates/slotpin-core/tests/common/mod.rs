//! Recording host used by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use slotpin_core::presentation::SlotItem;
use slotpin_core::{ActiveEditor, Host, HostError, ListChoice, MessageLevel, Position};

pub const ROOT: &str = "/work/proj";

pub fn abs(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

#[derive(Default)]
pub struct FakeHost {
    pub active: RefCell<Option<ActiveEditor>>,
    pub missing: RefCell<HashSet<PathBuf>>,
    pub opened: RefCell<Vec<(PathBuf, Position)>>,
    pub messages: RefCell<Vec<(MessageLevel, String)>>,
    pub prompts: RefCell<Vec<String>>,
    pub confirm_answer: RefCell<bool>,
    pub choice: RefCell<Option<ListChoice>>,
    pub listed: RefCell<Vec<SlotItem>>,
    pub keybinding_filters: RefCell<Vec<String>>,
    pub no_root: RefCell<bool>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus `rel` with the cursor at `(line, character)`.
    pub fn focus(&self, rel: &str, line: u32, character: u32) {
        *self.active.borrow_mut() = Some(ActiveEditor {
            path: abs(rel),
            position: Position::new(line, character),
        });
    }

    pub fn unfocus(&self) {
        *self.active.borrow_mut() = None;
    }

    pub fn mark_missing(&self, rel: &str) {
        self.missing.borrow_mut().insert(abs(rel));
    }

    pub fn answer_confirm(&self, yes: bool) {
        *self.confirm_answer.borrow_mut() = yes;
    }

    pub fn choose(&self, choice: Option<ListChoice>) {
        *self.choice.borrow_mut() = choice;
    }

    pub fn last_message(&self) -> Option<(MessageLevel, String)> {
        self.messages.borrow().last().cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn last_opened(&self) -> Option<(PathBuf, Position)> {
        self.opened.borrow().last().cloned()
    }
}

impl Host for FakeHost {
    fn active_editor(&self) -> Option<ActiveEditor> {
        self.active.borrow().clone()
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        if *self.no_root.borrow() {
            None
        } else {
            Some(PathBuf::from(ROOT))
        }
    }

    fn open_at(&self, path: &Path, position: Position) -> Result<(), HostError> {
        if self.missing.borrow().contains(path) {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: "not found".into(),
            });
        }
        self.opened.borrow_mut().push((path.to_path_buf(), position));
        Ok(())
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.borrow_mut().push(prompt.to_string());
        *self.confirm_answer.borrow()
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }

    fn choose_slot(&self, items: &[SlotItem]) -> Option<ListChoice> {
        *self.listed.borrow_mut() = items.to_vec();
        *self.choice.borrow()
    }

    fn open_keybindings(&self, filter: &str) -> Result<(), HostError> {
        self.keybinding_filters.borrow_mut().push(filter.to_string());
        Ok(())
    }
}
