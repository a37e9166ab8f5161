//! Path helpers.
//!
//! Every key in the engine is absolute, slash separated, and carries no
//! trailing slash except the root itself.

use std::path::{Component, Path, PathBuf};

/// Normalize a path: make it absolute, resolve `.` and `..`, drop
/// duplicate and trailing slashes.
///
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => {
                result.push(s);
            }
        }
    }
    result
}

/// The parent directory of a normalized path, or `None` for the root.
pub fn parent_of(path: &Path) -> Option<&Path> {
    path.parent()
}

/// Returns true if `path` is the root.
pub(crate) fn is_root(path: &Path) -> bool {
    path.parent().is_none()
}

/// Path string for error messages.
pub(crate) fn path_str(path: &Path) -> String {
    path.display().to_string()
}
