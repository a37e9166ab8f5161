//! # memvfs-kernel
//!
//! In-memory filesystem engine for memvfs.
//!
//! The kernel owns a process-local tree of directories and regular files.
//! Nothing is persisted: dropping the [`MemoryFs`] drops every byte it held.
//! A mount adapter (see `memvfs-server`) resolves kernel requests to paths
//! and calls into [`VfsOps`].

pub mod vfs;

pub use vfs::{
    backends::MemoryFs, ContentStore, DirEntry, FileAttr, FileHandle, FileType, HandleAllocator,
    OpenFlags, PathTable, SetAttr, StatFs, VfsError, VfsOps, VfsResult,
};
