//! Path table: absolute path → metadata record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::{VfsError, VfsResult};
use super::path::path_str;
use super::types::FileAttr;

/// Maps absolute paths to their [`FileAttr`] records.
///
/// The root `/` is inserted on construction. The table itself does not
/// protect it; [`MemoryFs`](super::MemoryFs) refuses to remove it.
#[derive(Debug)]
pub struct PathTable {
    entries: HashMap<PathBuf, FileAttr>,
}

impl PathTable {
    /// Create a table holding only the root directory.
    pub fn new(root_perm: u32) -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("/"), FileAttr::directory(root_perm));
        Self { entries }
    }

    /// Insert a record. Fails if the path is occupied.
    pub fn insert(&mut self, path: PathBuf, attr: FileAttr) -> VfsResult<()> {
        if self.entries.contains_key(&path) {
            return Err(VfsError::already_exists(path_str(&path)));
        }
        self.entries.insert(path, attr);
        Ok(())
    }

    /// Look up a record.
    pub fn get(&self, path: &Path) -> VfsResult<&FileAttr> {
        self.entries
            .get(path)
            .ok_or_else(|| VfsError::not_found(path_str(path)))
    }

    /// Look up a record for mutation.
    pub fn get_mut(&mut self, path: &Path) -> VfsResult<&mut FileAttr> {
        self.entries
            .get_mut(path)
            .ok_or_else(|| VfsError::not_found(path_str(path)))
    }

    /// Remove a record, returning it.
    pub fn remove(&mut self, path: &Path) -> VfsResult<FileAttr> {
        self.entries
            .remove(path)
            .ok_or_else(|| VfsError::not_found(path_str(path)))
    }

    /// Returns true if a record exists at `path`.
    #[cfg(test)]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Immediate children of `path`, as `(child_path, record)`.
    ///
    /// Computed by scanning every key for one whose parent component is
    /// `path`; descendants deeper down are not yielded. The iterator borrows
    /// the table, so calling again restarts the scan.
    pub fn children_of<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Iterator<Item = (&'a Path, &'a FileAttr)> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key.parent() == Some(path))
            .map(|(key, attr)| (key.as_path(), attr))
    }

    /// Returns true if anything lives directly under `path`.
    pub fn has_children(&self, path: &Path) -> bool {
        self.children_of(path).next().is_some()
    }

    /// Move the record at `from` and every descendant under `to`.
    ///
    /// Whatever sits at `to` is overwritten; callers clear it first. A
    /// missing `from` is reported before anything moves.
    pub fn rename_subtree(&mut self, from: &Path, to: &Path) -> VfsResult<()> {
        let attr = self.remove(from)?;

        let descendants: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(from))
            .cloned()
            .collect();

        for old in descendants {
            if let Some(child) = self.entries.remove(&old) {
                if let Ok(relative) = old.strip_prefix(from) {
                    self.entries.insert(to.join(relative), child);
                }
            }
        }

        self.entries.insert(to.to_path_buf(), attr);
        Ok(())
    }

    /// Number of records, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
