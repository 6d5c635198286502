//! Workspace-relative path helpers.
//!
//! Bindings store forward-slash separated paths relative to the workspace
//! root. Everything here is lexical: no filesystem access, no symlink
//! resolution, so deleted and renamed files can still be matched.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`, resolving `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalize `path`, taking relative paths relative to `root`.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    }
}

/// Express `path` relative to `root`, or `None` when it is not strictly
/// inside the root.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let root = normalize(root);
    let path = absolutize(&root, path);
    let rest = path.strip_prefix(&root).ok()?;

    let mut segments = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(seg) => segments.push(seg.to_str()?.to_string()),
            _ => return None,
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Absolute location of a stored relative path.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    let mut out = normalize(root);
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        out.push(segment);
    }
    out
}

/// `true` when a stored path is non-empty, relative, and stays inside the root.
pub fn is_workspace_relative(relative: &str) -> bool {
    if relative.is_empty() || relative.starts_with('/') || Path::new(relative).is_absolute() {
        return false;
    }
    relative
        .split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// `true` if `path` is `dir` itself or lies beneath it (component-wise).
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// Last segment of a forward-slash separated relative path.
pub fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}
