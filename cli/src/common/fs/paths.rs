//! # Juspawn Path Helpers
//!
//! File: cli/src/common/fs/paths.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Lexical path handling for volume directories. Nothing here touches the
//! filesystem: a volume that does not exist is only discovered when Docker
//! tries to mount it.
//!
use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against `cwd` and folds `.` and `..` components
/// without resolving symlinks. `..` at the root stays at the root.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Last path component as a string, or `None` for `/`.
pub fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
