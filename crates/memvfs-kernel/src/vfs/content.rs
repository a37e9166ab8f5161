//! Content store: file path → byte buffer.
//!
//! Only regular files have buffers. Sizes here are the source of truth;
//! the engine copies them into the matching [`FileAttr`](super::FileAttr)
//! after every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::{VfsError, VfsResult};
use super::path::path_str;

/// Raw byte buffers keyed by absolute path.
#[derive(Debug, Default)]
pub struct ContentStore {
    buffers: HashMap<PathBuf, Vec<u8>>,
}

impl ContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty buffer at `path`, replacing any previous one.
    pub fn create(&mut self, path: PathBuf) {
        self.buffers.insert(path, Vec::new());
    }

    /// Read up to `length` bytes at `offset`.
    ///
    /// Reads past the end are clipped, not errors: an offset beyond the
    /// buffer yields an empty vector.
    pub fn read_range(&self, path: &Path, offset: u64, length: u64) -> VfsResult<Vec<u8>> {
        let data = self
            .buffers
            .get(path)
            .ok_or_else(|| VfsError::not_found(path_str(path)))?;

        let start = clamp_to_len(offset, data.len());
        let end = clamp_to_len(offset.saturating_add(length), data.len());
        Ok(data[start..end].to_vec())
    }

    /// Write `bytes` at `offset`, returning the new buffer length.
    ///
    /// A gap between the current end and `offset` is zero-filled. Bytes
    /// past the end of the write are preserved. A missing buffer is started
    /// empty. If the buffer cannot grow far enough it is left as it was.
    pub fn write_range(&mut self, path: &Path, offset: u64, bytes: &[u8]) -> VfsResult<u64> {
        let start = to_index(offset, path)?;
        match self.buffers.get_mut(path) {
            Some(data) => splice(data, start, bytes, path),
            None => {
                let mut data = Vec::new();
                let len = splice(&mut data, start, bytes, path)?;
                self.buffers.insert(path.to_path_buf(), data);
                Ok(len)
            }
        }
    }

    /// Cut or zero-pad the buffer to exactly `length` bytes.
    pub fn truncate(&mut self, path: &Path, length: u64) -> VfsResult<()> {
        let length = to_index(length, path)?;
        let data = self
            .buffers
            .get_mut(path)
            .ok_or_else(|| VfsError::not_found(path_str(path)))?;
        if length > data.len() {
            grow(data, length, path)
        } else {
            data.truncate(length);
            Ok(())
        }
    }

    /// Drop the buffer at `path`. Missing buffers are ignored.
    pub fn remove(&mut self, path: &Path) -> Option<Vec<u8>> {
        self.buffers.remove(path)
    }

    /// Returns true if a buffer exists for `path`.
    #[cfg(test)]
    pub fn contains(&self, path: &Path) -> bool {
        self.buffers.contains_key(path)
    }

    /// Current length of the buffer at `path`.
    #[cfg(test)]
    pub fn len(&self, path: &Path) -> Option<u64> {
        self.buffers.get(path).map(|data| data.len() as u64)
    }

    /// Total bytes held across all buffers.
    pub fn total_bytes(&self) -> u64 {
        self.buffers.values().map(|data| data.len() as u64).sum()
    }

    /// Move the buffer at `from`, and any under it, beneath `to`.
    ///
    /// Files have no descendants, so for them this is a single move; for a
    /// directory it carries every file in the subtree.
    pub fn rename_subtree(&mut self, from: &Path, to: &Path) {
        let moving: Vec<PathBuf> = self
            .buffers
            .keys()
            .filter(|k| k.starts_with(from))
            .cloned()
            .collect();

        for old in moving {
            if let Some(data) = self.buffers.remove(&old) {
                let new = match old.strip_prefix(from) {
                    Ok(relative) if !relative.as_os_str().is_empty() => to.join(relative),
                    _ => to.to_path_buf(),
                };
                self.buffers.insert(new, data);
            }
        }
    }
}

fn clamp_to_len(pos: u64, len: usize) -> usize {
    usize::try_from(pos).map_or(len, |p| p.min(len))
}

fn to_index(pos: u64, path: &Path) -> VfsResult<usize> {
    usize::try_from(pos)
        .map_err(|_| VfsError::file_too_large(format!("{}: offset {}", path_str(path), pos)))
}

/// Copy `bytes` into `data` at `start`, growing it first if needed.
fn splice(data: &mut Vec<u8>, start: usize, bytes: &[u8], path: &Path) -> VfsResult<u64> {
    let end = start.checked_add(bytes.len()).ok_or_else(|| {
        VfsError::file_too_large(format!("{}: write past {}", path_str(path), usize::MAX))
    })?;
    grow(data, end, path)?;
    data[start..end].copy_from_slice(bytes);
    Ok(data.len() as u64)
}

/// Zero-extend `data` to `len` bytes. Fails without touching `data` when
/// the allocation cannot be made.
fn grow(data: &mut Vec<u8>, len: usize, path: &Path) -> VfsResult<()> {
    if len <= data.len() {
        return Ok(());
    }
    data.try_reserve_exact(len - data.len()).map_err(|e| {
        VfsError::file_too_large(format!("{}: cannot hold {} bytes: {}", path_str(path), len, e))
    })?;
    data.resize(len, 0);
    Ok(())
}
