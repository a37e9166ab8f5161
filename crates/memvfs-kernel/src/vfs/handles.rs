//! Handle allocation for open/create.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::FileHandle;

/// Issues strictly increasing [`FileHandle`]s, starting at 1.
///
/// Handles are never reused for the life of the allocator and carry no
/// state beyond the counter.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    last: AtomicU64,
}

impl HandleAllocator {
    /// Create an allocator whose first handle is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next handle.
    pub fn next(&self) -> FileHandle {
        FileHandle(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
