//! Process context: project root discovery and logging setup.

use std::path::{Path, PathBuf};

use slotpin_core::paths;
use slotpin_core::store::DOCUMENT_DIR;

/// Markers that identify a project root, checked in order at each level.
const ROOT_MARKERS: &[&str] = &[DOCUMENT_DIR, ".git"];

/// Nearest ancestor of `start` (inclusive) holding a root marker.
pub fn discover_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Resolve the project root.
///
/// Resolution order:
/// 1. Explicit `--root` / `SLOTPIN_ROOT`
/// 2. Nearest ancestor of the cwd with `.slotpin` or `.git`
/// 3. The cwd
pub fn resolve_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let root = match explicit {
        Some(path) => paths::absolutize(&cwd, path),
        None => discover_root(&cwd).unwrap_or(cwd),
    };
    if !root.is_dir() {
        anyhow::bail!("project root {} is not a directory", root.display());
    }
    Ok(root)
}

/// Make a command-line path absolute against the cwd.
pub fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(paths::absolutize(&std::env::current_dir()?, path))
}

/// Install the stderr subscriber. `SLOTPIN_LOG` wins over `RUST_LOG`.
pub fn init_tracing(default_filter: &str) {
    let filter = std::env::var("SLOTPIN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
