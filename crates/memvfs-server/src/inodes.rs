//! Inode ↔ path mapping for the mount adapter.
//!
//! The engine is path-based; the kernel speaks inode numbers. This table
//! hands out a stable number per path, starting at 2 (1 is the root), and
//! follows renames so open inodes keep resolving.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::constants::ROOT_INO;

/// Bidirectional inode table.
#[derive(Debug)]
pub struct InodeTable {
    paths: HashMap<u64, PathBuf>,
    inodes: HashMap<PathBuf, u64>,
    next: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let root = PathBuf::from("/");
        let mut paths = HashMap::new();
        let mut inodes = HashMap::new();
        paths.insert(ROOT_INO, root.clone());
        inodes.insert(root, ROOT_INO);
        Self {
            paths,
            inodes,
            next: ROOT_INO + 1,
        }
    }

    /// Path for an inode the kernel already knows.
    pub fn path(&self, ino: u64) -> Option<&Path> {
        self.paths.get(&ino).map(PathBuf::as_path)
    }

    /// Path of `name` inside the directory `parent`.
    pub fn child_path(&self, parent: u64, name: &OsStr) -> Option<PathBuf> {
        self.path(parent).map(|dir| dir.join(name))
    }

    /// Inode for `path`, assigning a new one on first sight.
    pub fn ino_for(&mut self, path: &Path) -> u64 {
        if let Some(&ino) = self.inodes.get(path) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.to_path_buf());
        self.inodes.insert(path.to_path_buf(), ino);
        ino
    }

    /// Drop the mapping for a removed path.
    pub fn forget(&mut self, path: &Path) {
        if let Some(ino) = self.inodes.remove(path) {
            self.paths.remove(&ino);
        }
    }

    /// Re-key `from` and everything below it onto `to`.
    ///
    /// Whatever was mapped at or below `to` is forgotten first, since the
    /// rename replaced it.
    pub fn rename(&mut self, from: &Path, to: &Path) {
        if from == to {
            return;
        }

        let replaced: Vec<PathBuf> = self
            .inodes
            .keys()
            .filter(|p| p.starts_with(to))
            .cloned()
            .collect();
        for path in replaced {
            self.forget(&path);
        }

        let moved: Vec<(PathBuf, u64)> = self
            .inodes
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, &ino)| (p.clone(), ino))
            .collect();
        for (old, ino) in moved {
            let new = match old.strip_prefix(from) {
                Ok(rel) if !rel.as_os_str().is_empty() => to.join(rel),
                _ => to.to_path_buf(),
            };
            self.inodes.remove(&old);
            self.inodes.insert(new.clone(), ino);
            self.paths.insert(ino, new);
        }
    }

    /// Number of mapped inodes, root included.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
