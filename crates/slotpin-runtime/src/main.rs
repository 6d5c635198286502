//! slotpin: numbered file slots from the command line.
//!
//! Each invocation plays the editor host for one event: it resolves the
//! project root, opens the JSON document store there, and hands the event
//! to the core dispatcher. `watch` stays up and feeds filesystem events.

use std::path::PathBuf;

use clap::Parser;
use slotpin_core::{
    ActiveEditor, CommandId, Dispatcher, Host, HostEvent, JsonFileStore, Position, SlotStore,
};

mod cli;
mod cmd_list;
mod cmd_watch;
mod context;
mod terminal;

use terminal::TerminalHost;

/// Run one event; the exit status is non-zero when it failed.
fn run_event(store: &dyn SlotStore, host: &dyn Host, event: HostEvent) -> i32 {
    match Dispatcher::new(store, host).handle(event) {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            1
        }
    }
}

fn absolute_all(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    paths.iter().map(|p| context::absolute(p)).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let default_filter = match args.command {
        cli::Command::Watch => "info",
        _ => "warn",
    };
    context::init_tracing(default_filter);

    let root = context::resolve_root(args.root.as_deref())?;
    tracing::debug!(root = %root.display(), "project root");
    let store = JsonFileStore::for_root(&root);

    let exit_code = match args.command {
        cli::Command::Pin(opts) => {
            let active = ActiveEditor {
                path: context::absolute(&opts.file)?,
                position: Position::new(opts.line, opts.character),
            };
            let host = TerminalHost::stdio(root, Some(active));
            run_event(&store, &host, HostEvent::Command(CommandId::PinToSlot(opts.slot)))
        }
        cli::Command::Jump(opts) => {
            let host = TerminalHost::stdio(root, None);
            run_event(&store, &host, HostEvent::Command(CommandId::JumpToSlot(opts.slot)))
        }
        cli::Command::Clear(opts) => {
            let host = TerminalHost::stdio(root, None);
            run_event(&store, &host, HostEvent::Command(CommandId::ClearSlot(opts.slot)))
        }
        cli::Command::Mode(opts) => {
            let host = TerminalHost::stdio(root, None);
            let event = match opts.mode {
                Some(mode) => HostEvent::SetMode {
                    slot: opts.slot,
                    mode,
                },
                None => HostEvent::Command(CommandId::SetSlotMode(opts.slot)),
            };
            run_event(&store, &host, event)
        }
        cli::Command::Status(opts) => {
            let active = opts.active.as_deref().map(context::absolute).transpose()?;
            cmd_list::cmd_status(
                &store,
                &root,
                active.as_deref(),
                opts.json,
                &mut std::io::stdout(),
            )?;
            0
        }
        cli::Command::List(opts) => {
            let active = opts.active.as_deref().map(context::absolute).transpose()?;
            cmd_list::cmd_list(
                &store,
                &root,
                active.as_deref(),
                opts.json,
                &mut std::io::stdout(),
            )?;
            0
        }
        cli::Command::Pick(opts) => {
            let active = opts
                .active
                .as_deref()
                .map(context::absolute)
                .transpose()?
                .map(|path| ActiveEditor {
                    path,
                    position: Position::default(),
                });
            let host = TerminalHost::stdio(root, active);
            run_event(&store, &host, HostEvent::Command(CommandId::ShowStatus))
        }
        cli::Command::Left(opts) => {
            let host = TerminalHost::stdio(root, None);
            let event = HostEvent::FocusLeft {
                path: context::absolute(&opts.file)?,
                position: Position::new(opts.line, opts.character),
            };
            run_event(&store, &host, event)
        }
        cli::Command::Deleted(opts) => {
            let host = TerminalHost::stdio(root, None);
            run_event(&store, &host, HostEvent::FilesDeleted(absolute_all(&opts.paths)?))
        }
        cli::Command::Renamed(opts) => {
            let host = TerminalHost::stdio(root, None);
            let rename = (context::absolute(&opts.old)?, context::absolute(&opts.new)?);
            run_event(&store, &host, HostEvent::FilesRenamed(vec![rename]))
        }
        cli::Command::Watch => {
            cmd_watch::cmd_watch(&root).await?;
            0
        }
        cli::Command::Keybindings => {
            let host = TerminalHost::stdio(root, None);
            run_event(
                &store,
                &host,
                HostEvent::Command(CommandId::ConfigureKeybindings),
            )
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
