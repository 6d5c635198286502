//! `slotpin watch`: filesystem watch feeding delete / rename repair.
//!
//! The notify callback runs on the watcher's own thread and forwards raw
//! events over an mpsc channel. The main task classifies each one into host
//! events and runs them to completion before taking the next.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use slotpin_core::store::DOCUMENT_DIR;
use slotpin_core::{Dispatcher, HostEvent, JsonFileStore, SlotStore, SlotTable, paths};
use tokio::sync::mpsc;

use crate::terminal::TerminalHost;

/// Directories whose churn never concerns a slot.
const IGNORED_DIRS: &[&str] = &[".git"];

/// How long the source half of a rename waits for its destination.
pub const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(250);

/// Turns raw notify events into host events.
///
/// Backends report renames differently: inotify sends `From`, `To`, then
/// `Both`; FSEvents sends one `Any` per side. The source half is held until
/// a destination arrives. A source left unpaired (moved out of the project)
/// becomes a deletion on the next source or removal, or when
/// [`flush`](Self::flush) is called after [`RENAME_PAIR_WINDOW`].
#[derive(Debug)]
pub struct EventClassifier {
    root: PathBuf,
    document: PathBuf,
    document_dir: PathBuf,
    pending_source: Option<PathBuf>,
    /// Rename already emitted from its halves; the `Both` event repeating it
    /// is dropped.
    last_paired: Option<(PathBuf, PathBuf)>,
}

impl EventClassifier {
    pub fn new(root: &Path, document: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            document: document.to_path_buf(),
            document_dir: root.join(DOCUMENT_DIR),
            pending_source: None,
            last_paired: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending_source.is_some()
    }

    /// Give up on the pending rename source. It counts as deleted unless
    /// something has been created at its path since.
    pub fn flush(&mut self) -> Option<HostEvent> {
        let source = self.pending_source.take()?;
        if source.exists() {
            tracing::debug!(path = %source.display(), "rename source reappeared");
            return None;
        }
        Some(HostEvent::FilesDeleted(vec![source]))
    }

    /// Host events for one notify event, in the order they should run.
    ///
    /// - anything touching the slot document becomes `ConfigurationChanged`
    /// - a removal becomes `FilesDeleted`
    /// - a rename, paired from whichever halves the backend sends, becomes
    ///   `FilesRenamed`
    pub fn classify(&mut self, event: &Event) -> Vec<HostEvent> {
        let mut out = Vec::new();

        if event.paths.iter().any(|p| p == &self.document) {
            if !matches!(event.kind, EventKind::Access(_)) {
                out.push(HostEvent::ConfigurationChanged);
            }
            return out;
        }

        let relevant: Vec<PathBuf> = event
            .paths
            .iter()
            .filter(|p| !paths::is_within(p, &self.document_dir) && !is_ignored(&self.root, p))
            .cloned()
            .collect();
        if relevant.is_empty() {
            return out;
        }

        match event.kind {
            EventKind::Remove(_) => {
                out.extend(self.flush());
                out.push(HostEvent::FilesDeleted(relevant));
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [old, new] = event.paths.as_slice() {
                    if self.pending_source.as_ref() == Some(old) {
                        self.pending_source = None;
                    } else {
                        out.extend(self.flush());
                    }
                    let pair = (old.clone(), new.clone());
                    if self.last_paired.take().as_ref() != Some(&pair) {
                        out.push(HostEvent::FilesRenamed(vec![pair]));
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                out.extend(self.flush());
                self.pending_source = relevant.into_iter().next();
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                if let (Some(old), Some(new)) = (self.pending_source.take(), relevant.first()) {
                    self.last_paired = Some((old.clone(), new.clone()));
                    out.push(HostEvent::FilesRenamed(vec![(old, new.clone())]));
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in relevant {
                    if path.exists() {
                        if let Some(old) = self.pending_source.take() {
                            out.push(HostEvent::FilesRenamed(vec![(old, path)]));
                        }
                    } else {
                        out.extend(self.flush());
                        self.pending_source = Some(path);
                    }
                }
            }
            _ => {}
        }

        out
    }
}

fn is_ignored(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rest| {
            rest.components()
                .any(|c| IGNORED_DIRS.iter().any(|d| c.as_os_str() == *d))
        })
        .unwrap_or(true)
}

/// Entry point for `slotpin watch`. Runs until Ctrl-C.
pub async fn cmd_watch(root: &Path) -> anyhow::Result<()> {
    let store = JsonFileStore::for_root(root);
    store.subscribe(Box::new(|table: &SlotTable| {
        tracing::debug!(slots = table.len(), "slot table changed");
    }));

    let host = TerminalHost::stdio(root.to_path_buf(), None);
    let dispatcher = Dispatcher::new(&store, &host);

    let (notify_tx, mut notify_rx) = mpsc::channel::<notify::Result<Event>>(256);
    let mut watcher: RecommendedWatcher = {
        let tx = notify_tx.clone();
        notify::recommended_watcher(move |res| {
            let _ = tx.blocking_send(res);
        })?
    };
    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::info!(root = %root.display(), "watching project");

    let mut classifier = EventClassifier::new(root, store.path());
    let mut last_status = None;
    print_status_if_changed(&dispatcher, &host, &mut last_status);

    loop {
        let pending = classifier.has_pending();
        tokio::select! {
            received = notify_rx.recv() => {
                let Some(result) = received else { break };
                match result {
                    Ok(event) => {
                        for host_event in classifier.classify(&event) {
                            dispatch(&dispatcher, &host, &mut last_status, host_event);
                        }
                    }
                    Err(e) => tracing::warn!("watcher error: {e}"),
                }
            }
            _ = tokio::time::sleep(RENAME_PAIR_WINDOW), if pending => {
                if let Some(host_event) = classifier.flush() {
                    dispatch(&dispatcher, &host, &mut last_status, host_event);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("watch stopped");
    Ok(())
}

fn dispatch<R, W>(
    dispatcher: &Dispatcher<'_>,
    host: &TerminalHost<R, W>,
    last_status: &mut Option<String>,
    event: HostEvent,
) where
    R: std::io::BufRead,
    W: std::io::Write,
{
    tracing::debug!(?event, "filesystem event");
    // Failures were already reported through the host.
    let _ = dispatcher.handle(event);
    print_status_if_changed(dispatcher, host, last_status);
}

fn print_status_if_changed<R, W>(
    dispatcher: &Dispatcher<'_>,
    host: &TerminalHost<R, W>,
    last: &mut Option<String>,
) where
    R: std::io::BufRead,
    W: std::io::Write,
{
    match dispatcher.status_summary() {
        Ok(summary) => {
            let line = summary.to_string();
            if last.as_deref() != Some(line.as_str()) {
                host.println(&line);
                *last = Some(line);
            }
        }
        Err(e) => tracing::warn!(error = %e, "cannot render status"),
    }
}
