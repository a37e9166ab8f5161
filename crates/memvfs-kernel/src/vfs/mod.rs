//! Virtual Filesystem engine.
//!
//! This module provides a path-based in-memory filesystem designed to sit
//! behind a FUSE-style adapter. Key components:
//!
//! - [`PathTable`] - Absolute path → metadata record
//! - [`ContentStore`] - File path → byte buffer
//! - [`HandleAllocator`] - Opaque handle ids for open/create
//! - [`VfsOps`] - Core trait for filesystem operations
//! - [`MemoryFs`] - The engine composing the three tables
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: Operations use paths, not inode numbers.
//!   Adapters handle inode ↔ path mapping locally.
//! - **Explicit offset/size**: Read/write take offset and size; content is
//!   always found by path, never by handle.
//! - **Shallow listing by scan**: Directory listings scan every key for a
//!   matching parent component. O(entries) per listing, no child index.
//! - **One lock**: Both tables live behind a single mutex held for the
//!   whole of each operation, so multi-step mutations (rename, mkdir with
//!   its parent link count) are atomic.

pub mod backends;
mod content;
mod error;
mod handles;
mod ops;
mod path;
mod path_table;
mod types;

pub use backends::MemoryFs;
pub use content::ContentStore;
pub use error::{VfsError, VfsResult};
pub use handles::HandleAllocator;
pub use ops::VfsOps;
pub use path::{normalize, parent_of};
pub use path_table::PathTable;
pub use types::{DirEntry, FileAttr, FileHandle, FileType, OpenFlags, SetAttr, StatFs};
