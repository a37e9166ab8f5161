//! Core VFS types.
//!
//! These types are path-based (no inodes) and serializable, so an adapter
//! can hand them across whatever boundary it speaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Type bits for a directory (`S_IFDIR`).
pub const S_IFDIR: u32 = 0o040000;
/// Type bits for a regular file (`S_IFREG`).
pub const S_IFREG: u32 = 0o100000;
/// Mask for the permission bits (including setuid/setgid/sticky).
pub const PERM_MASK: u32 = 0o7777;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// The `S_IFMT` type bits for this kind.
    pub fn type_bits(&self) -> u32 {
        match self {
            FileType::File => S_IFREG,
            FileType::Directory => S_IFDIR,
        }
    }
}

/// File attributes (the per-path metadata record).
///
/// Type bits are never stored: they are derived from `kind`, so a chmod
/// cannot turn a file into a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes. Always 0 for directories.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o644).
    pub perm: u32,
    /// Creation time.
    pub crtime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time.
    pub atime: SystemTime,
    /// Number of hard links.
    pub nlink: u32,
    /// Owner user ID, set only by chown.
    pub uid: Option<u32>,
    /// Owner group ID, set only by chown.
    pub gid: Option<u32>,
}

impl FileAttr {
    /// Create attributes for a new, empty file.
    pub fn file(perm: u32) -> Self {
        let now = SystemTime::now();
        Self {
            size: 0,
            kind: FileType::File,
            perm: perm & PERM_MASK,
            crtime: now,
            mtime: now,
            atime: now,
            nlink: 1,
            uid: None,
            gid: None,
        }
    }

    /// Create attributes for a new directory.
    pub fn directory(perm: u32) -> Self {
        let now = SystemTime::now();
        Self {
            size: 0,
            kind: FileType::Directory,
            perm: perm & PERM_MASK,
            crtime: now,
            mtime: now,
            atime: now,
            nlink: 2, // . and ..
            uid: None,
            gid: None,
        }
    }

    /// Full `st_mode`: type bits plus permission bits.
    pub fn mode(&self) -> u32 {
        self.kind.type_bits() | self.perm
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileType::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory)
    }
}

/// Opaque token returned by open and create.
///
/// Handles never identify content; the engine always looks files up by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileHandle(pub(crate) u64);

impl FileHandle {
    /// Raw handle value. Never zero.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Rebuild a handle from the raw value a mount adapter got back
    /// from the kernel.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fh#{}", self.0)
    }
}

/// Attributes to set (for setattr operation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetAttr {
    /// New size (truncate/extend).
    pub size: Option<u64>,
    /// New modification time.
    pub mtime: Option<SystemTime>,
    /// New access time.
    pub atime: Option<SystemTime>,
    /// New permissions.
    pub perm: Option<u32>,
    /// New user ID.
    pub uid: Option<u32>,
    /// New group ID.
    pub gid: Option<u32>,
}

impl SetAttr {
    /// Create a new empty SetAttr.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: SystemTime) -> Self {
        self.mtime = Some(mtime);
        self
    }

    /// Set the access time.
    pub fn with_atime(mut self, atime: SystemTime) -> Self {
        self.atime = Some(atime);
        self
    }

    /// Set permissions.
    pub fn with_perm(mut self, perm: u32) -> Self {
        self.perm = Some(perm);
        self
    }

    /// Set owner.
    pub fn with_owner(mut self, uid: Option<u32>, gid: Option<u32>) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Returns true if nothing would change.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.mtime.is_none()
            && self.atime.is_none()
            && self.perm.is_none()
            && self.uid.is_none()
            && self.gid.is_none()
    }
}

/// Filesystem statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatFs {
    /// Total blocks.
    pub blocks: u64,
    /// Free blocks.
    pub bfree: u64,
    /// Available blocks (to non-root).
    pub bavail: u64,
    /// Total inodes.
    pub files: u64,
    /// Free inodes.
    pub ffree: u64,
    /// Block size.
    pub bsize: u32,
    /// Maximum name length.
    pub namelen: u32,
    /// Fragment size.
    pub frsize: u32,
}

impl Default for StatFs {
    fn default() -> Self {
        Self {
            blocks: 1024 * 1024,      // 1M blocks
            bfree: 1024 * 1024,
            bavail: 1024 * 1024,
            files: 1024 * 1024,       // 1M inodes
            ffree: 1024 * 1024,
            bsize: 4096,              // 4KB blocks
            namelen: 255,             // standard
            frsize: 4096,             // same as bsize
        }
    }
}

impl StatFs {
    /// Statistics for a filesystem holding `entries` paths and `bytes` of content.
    pub fn with_usage(entries: u64, bytes: u64) -> Self {
        let base = Self::default();
        let used_blocks = bytes.div_ceil(base.bsize as u64);
        Self {
            bfree: base.blocks.saturating_sub(used_blocks),
            bavail: base.blocks.saturating_sub(used_blocks),
            ffree: base.files.saturating_sub(entries),
            ..base
        }
    }
}

/// Open file flags.
///
/// The memory engine only records these for tracing; content is always
/// resolved by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode.
    pub append: bool,
    /// Truncate on open.
    pub truncate: bool,
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    /// Write access (also enables read).
    pub fn write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
        assert_eq!(FileType::Directory.type_bits(), S_IFDIR);
    }

    #[test]
    fn test_file_attr_constructors() {
        let file = FileAttr::file(0o644);
        assert!(file.is_file());
        assert_eq!(file.size, 0);
        assert_eq!(file.nlink, 1);
        assert_eq!(file.mode(), S_IFREG | 0o644);
        assert!(file.uid.is_none());

        let dir = FileAttr::directory(0o755);
        assert!(dir.is_dir());
        assert_eq!(dir.perm, 0o755);
        assert_eq!(dir.nlink, 2);
        assert_eq!(dir.mode(), 0o040755);
    }

    #[test]
    fn test_type_bits_in_mode_are_dropped() {
        // Callers sometimes pass a full st_mode; only permission bits stick.
        let file = FileAttr::file(S_IFDIR | 0o600);
        assert!(file.is_file());
        assert_eq!(file.mode(), S_IFREG | 0o600);
    }

    #[test]
    fn test_dir_entry() {
        let file = DirEntry::file("test.txt");
        assert_eq!(file.name, "test.txt");
        assert!(file.kind.is_file());

        let dir = DirEntry::directory("subdir");
        assert!(dir.kind.is_dir());
    }

    #[test]
    fn test_setattr_builder() {
        let attr = SetAttr::new().with_size(2048).with_perm(0o600);
        assert_eq!(attr.size, Some(2048));
        assert_eq!(attr.perm, Some(0o600));
        assert!(attr.mtime.is_none());
        assert!(!attr.is_empty());
        assert!(SetAttr::new().is_empty());
    }

    #[test]
    fn test_statfs_usage() {
        let stats = StatFs::with_usage(3, 4097);
        assert_eq!(stats.blocks - stats.bfree, 2);
        assert_eq!(stats.files - stats.ffree, 3);
    }

    #[test]
    fn test_open_flags() {
        let read = OpenFlags::read();
        assert!(read.read);
        assert!(!read.write);

        let write = OpenFlags::write();
        assert!(write.read && write.write);
    }
}
