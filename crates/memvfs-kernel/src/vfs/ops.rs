//! VFS operations trait.
//!
//! This trait defines the core filesystem operations in a way that suits a
//! mount adapter: path-based, no inodes, explicit offset/size.

use std::path::Path;
use std::time::SystemTime;

use super::types::{DirEntry, FileAttr, FileHandle, OpenFlags, SetAttr, StatFs};
use super::VfsResult;

/// Core VFS operations trait.
///
/// All operations are path-based (no inode numbers). The adapter handles
/// inode ↔ path mapping locally. Paths are absolute; implementations
/// normalize them before use.
///
/// Every method is synchronous and runs to completion. Implementations
/// either apply the whole operation or return an error having changed
/// nothing.
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes.
    fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Read directory entries.
    ///
    /// Returns `.` and `..` followed by the immediate children.
    fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Read file contents.
    ///
    /// Reads up to `size` bytes starting at `offset`.
    /// Returns fewer bytes if EOF is reached.
    fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write data to a file.
    ///
    /// Writes `data` at the specified `offset`, zero-filling any gap.
    /// Returns the number of bytes written.
    fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32>;

    /// Create a new, empty file and open it.
    fn create(&self, path: &Path, mode: u32) -> VfsResult<(FileAttr, FileHandle)>;

    /// Create a new directory.
    ///
    /// Returns the attributes of the newly created directory.
    fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<FileAttr>;

    /// Remove a file.
    fn unlink(&self, path: &Path) -> VfsResult<()>;

    /// Remove an empty directory.
    fn rmdir(&self, path: &Path) -> VfsResult<()>;

    /// Rename a file or directory, replacing whatever is at `to`.
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Truncate or extend a file to the specified size.
    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()>;

    /// Replace permission bits, keeping the file type.
    fn chmod(&self, path: &Path, mode: u32) -> VfsResult<()>;

    /// Set owner fields. `None` leaves that field as it is.
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> VfsResult<()>;

    /// Set access and modification times.
    fn utimens(
        &self,
        path: &Path,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
    ) -> VfsResult<()>;

    /// Set file attributes in one step.
    fn setattr(&self, path: &Path, attr: SetAttr) -> VfsResult<FileAttr>;

    // ========================================================================
    // Handles
    // ========================================================================

    /// Open a file, returning a fresh handle.
    ///
    /// Issuing a handle does not check that the path exists; reads and
    /// writes report missing files.
    fn open(&self, path: &Path, flags: OpenFlags) -> FileHandle;

    /// Acknowledge that a handle was closed.
    fn release(&self, path: &Path, fh: FileHandle);

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Get filesystem statistics.
    fn statfs(&self) -> StatFs;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool {
        self.getattr(path).is_ok()
    }

    /// Read entire file contents.
    fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let attr = self.getattr(path)?;
        let size = u32::try_from(attr.size).unwrap_or(u32::MAX);
        self.read(path, 0, size)
    }

    /// Write entire file contents.
    ///
    /// Truncates an existing file or creates a new one, then writes.
    fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        if self.exists(path) {
            self.truncate(path, 0)?;
        } else {
            self.create(path, 0o644)?;
        }
        self.write(path, 0, data)?;
        Ok(())
    }
}
