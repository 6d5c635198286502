//! Terminal host: the [`Host`] services backed by stdin / stdout and `$EDITOR`.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use slotpin_core::commands::COMMAND_NAMESPACE;
use slotpin_core::presentation::{SlotAction, SlotItem};
use slotpin_core::{
    ActiveEditor, CommandId, Host, HostError, ListChoice, MessageLevel, Position,
};

/// Editor invocation resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub program: String,
}

impl Editor {
    /// `$VISUAL`, then `$EDITOR`. Empty values count as unset.
    pub fn from_env() -> Option<Self> {
        ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .map(|program| Self { program })
    }

    /// Arguments that open `path` at the zero-based `position`.
    pub fn args(&self, path: &Path, position: Position) -> Vec<String> {
        let line = position.line + 1;
        let column = position.character + 1;
        let name = Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program);
        match name {
            "code" | "code-insiders" | "codium" | "cursor" => vec![
                "--goto".to_string(),
                format!("{}:{line}:{column}", path.display()),
            ],
            "hx" | "helix" | "subl" | "zed" => {
                vec![format!("{}:{line}:{column}", path.display())]
            }
            _ => vec![format!("+{line}"), path.display().to_string()],
        }
    }
}

/// Host for one CLI invocation.
pub struct TerminalHost<R, W> {
    root: PathBuf,
    active: Option<ActiveEditor>,
    editor: Option<Editor>,
    input: RefCell<R>,
    output: RefCell<W>,
}

impl TerminalHost<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio(root: PathBuf, active: Option<ActiveEditor>) -> Self {
        Self::new(
            root,
            active,
            Editor::from_env(),
            std::io::stdin().lock(),
            std::io::stdout(),
        )
    }
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    pub fn new(
        root: PathBuf,
        active: Option<ActiveEditor>,
        editor: Option<Editor>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            root,
            active,
            editor,
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    /// Write one line. A closed stdout is not worth failing a command over.
    pub fn println(&self, line: &str) {
        let mut out = self.output.borrow_mut();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }

    fn prompt(&self, question: &str) -> Option<String> {
        {
            let mut out = self.output.borrow_mut();
            let _ = write!(out, "{question}").and_then(|()| out.flush());
        }
        let mut line = String::new();
        match self.input.borrow_mut().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
    fn active_editor(&self) -> Option<ActiveEditor> {
        self.active.clone()
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn open_at(&self, path: &Path, position: Position) -> Result<(), HostError> {
        if !path.is_file() {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: "no such file".into(),
            });
        }

        let Some(editor) = &self.editor else {
            self.println(&format!("{}:{position}", self.display_path(path)));
            return Ok(());
        };

        tracing::debug!(editor = %editor.program, path = %path.display(), %position, "spawning editor");
        let status = Command::new(&editor.program)
            .args(editor.args(path, position))
            .status()
            .map_err(|e| HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: format!("{}: {e}", editor.program),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: format!("{} exited with {status}", editor.program),
            })
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        matches!(
            self.prompt(&format!("{prompt} [y/N] ")).as_deref(),
            Some("y" | "Y" | "yes" | "Yes")
        )
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Info => self.println(message),
            MessageLevel::Warning => self.println(&format!("warning: {message}")),
            MessageLevel::Error => self.println(&format!("error: {message}")),
        }
    }

    fn choose_slot(&self, items: &[SlotItem]) -> Option<ListChoice> {
        for line in format_list(items) {
            self.println(&line);
        }
        let answer = self.prompt("slot [action: p=pin, m=mode, c=clear]: ")?;
        parse_choice(&answer, items)
    }

    fn open_keybindings(&self, filter: &str) -> Result<(), HostError> {
        for line in keybinding_lines(filter) {
            self.println(&line);
        }
        Ok(())
    }
}

// ─── Formatting ───────────────────────────────────────────────────

/// Two-column slot list: label, then description.
pub fn format_list(items: &[SlotItem]) -> Vec<String> {
    let width = items.iter().map(|i| i.label.chars().count()).max().unwrap_or(0);
    items
        .iter()
        .map(|item| {
            let pad = width - item.label.chars().count();
            format!("{}{}  {}", item.label, " ".repeat(pad), item.description)
        })
        .collect()
}

/// Parse a list answer: `<slot>` or `<slot> <action>`.
///
/// Actions not offered by the chosen item are rejected.
pub fn parse_choice(answer: &str, items: &[SlotItem]) -> Option<ListChoice> {
    let mut words = answer.split_whitespace();
    let slot = words.next()?.parse().ok()?;
    let item = items.iter().find(|i| i.slot == slot)?;

    let action = match words.next() {
        None => None,
        Some("p" | "pin") => Some(SlotAction::Rebind),
        Some("m" | "mode") => Some(SlotAction::ToggleMode),
        Some("c" | "clear") => Some(SlotAction::Clear),
        Some(_) => return None,
    };
    if let Some(action) = action {
        if !item.actions.contains(&action) {
            return None;
        }
    }
    Some(ListChoice { slot, action })
}

/// Suggested binding for a command, editor-style.
pub fn suggested_key(id: CommandId) -> Option<String> {
    match id {
        CommandId::JumpToSlot(s) => Some(format!("ctrl+{s}")),
        CommandId::PinToSlot(s) => Some(format!("ctrl+shift+{s}")),
        CommandId::ClearSlot(s) => Some(format!("ctrl+alt+{s}")),
        CommandId::ShowStatus => Some("ctrl+alt+0".to_string()),
        CommandId::SetSlotMode(_) | CommandId::ConfigureKeybindings => None,
    }
}

/// Keybinding table for every command whose qualified id starts with `filter`.
pub fn keybinding_lines(filter: &str) -> Vec<String> {
    let ids: Vec<CommandId> = CommandId::all()
        .into_iter()
        .filter(|id| id.qualified().starts_with(filter))
        .collect();
    let width = ids.iter().map(|id| id.qualified().len()).max().unwrap_or(0);

    let mut lines = vec![format!("# commands in the {COMMAND_NAMESPACE} namespace")];
    for id in ids {
        let key = suggested_key(id).unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<width$}  {key:<14}  {}",
            id.qualified(),
            id.title()
        ));
    }
    lines
}
