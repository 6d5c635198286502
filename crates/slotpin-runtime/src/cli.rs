//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use slotpin_core::{Slot, TrackingMode};

#[derive(Parser, Debug)]
#[command(name = "slotpin", about = "numbered file slots for a project")]
pub struct Cli {
    /// Project root (default: nearest ancestor with .slotpin or .git)
    #[arg(long, short = 'r', global = true, env = "SLOTPIN_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pin a file to a slot
    Pin(PinOpts),
    /// Open the file in a slot at its stored position
    Jump(SlotOpts),
    /// Remove the binding in a slot
    Clear(SlotOpts),
    /// Set or toggle the tracking mode of a slot
    Mode(ModeOpts),
    /// One-line summary of the bound slots
    Status(ListOpts),
    /// Every configured slot, bound or empty
    List(ListOpts),
    /// Choose a slot interactively and act on it
    Pick(ListOpts),
    /// Record the cursor of a file that lost focus
    Left(LeftOpts),
    /// Report deleted files or directories
    Deleted(DeletedOpts),
    /// Report a renamed file or directory
    Renamed(RenamedOpts),
    /// Watch the project and repair slots on delete / rename
    Watch,
    /// Print the command ids and suggested keybindings
    Keybindings,
}

#[derive(clap::Args, Debug)]
pub struct SlotOpts {
    /// Slot number (1-9)
    pub slot: Slot,
}

#[derive(clap::Args, Debug)]
pub struct PinOpts {
    /// Slot number (1-9)
    pub slot: Slot,

    /// File to pin, treated as the active file
    pub file: PathBuf,

    /// Zero-based cursor line
    #[arg(long, default_value = "0")]
    pub line: u32,

    /// Zero-based cursor column
    #[arg(long, default_value = "0")]
    pub character: u32,
}

#[derive(clap::Args, Debug)]
pub struct ModeOpts {
    /// Slot number (1-9)
    pub slot: Slot,

    /// `auto` or `static`; toggles when omitted
    pub mode: Option<TrackingMode>,
}

#[derive(clap::Args, Debug, Default)]
pub struct ListOpts {
    /// Mark this file as the active one
    #[arg(long)]
    pub active: Option<PathBuf>,

    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct LeftOpts {
    pub file: PathBuf,

    #[arg(long)]
    pub line: u32,

    #[arg(long)]
    pub character: u32,
}

#[derive(clap::Args, Debug)]
pub struct DeletedOpts {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RenamedOpts {
    pub old: PathBuf,
    pub new: PathBuf,
}
