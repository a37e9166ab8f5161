//! Translation between kernel request values and engine types.

use libc::c_int;
use memvfs_kernel::{OpenFlags, VfsError};

/// errno for an engine error.
pub fn errno(err: &VfsError) -> c_int {
    match err {
        VfsError::NotFound(_) => libc::ENOENT,
        VfsError::AlreadyExists(_) => libc::EEXIST,
        VfsError::DirectoryNotEmpty(_) => libc::ENOTEMPTY,
        VfsError::NotADirectory(_) => libc::ENOTDIR,
        VfsError::IsADirectory(_) => libc::EISDIR,
        VfsError::PermissionDenied(_) => libc::EPERM,
        VfsError::InvalidPath(_) => libc::EINVAL,
        VfsError::FileTooLarge(_) => libc::EFBIG,
        VfsError::Other(_) => libc::EIO,
    }
}

/// Decode `open(2)` flags.
pub fn open_flags(flags: i32) -> OpenFlags {
    let access = flags & libc::O_ACCMODE;
    OpenFlags {
        read: access == libc::O_RDONLY || access == libc::O_RDWR,
        write: access == libc::O_WRONLY || access == libc::O_RDWR,
        append: flags & libc::O_APPEND != 0,
        truncate: flags & libc::O_TRUNC != 0,
    }
}

/// Kernel offsets arrive signed; negative ones are invalid.
pub fn offset(raw: i64) -> Result<u64, c_int> {
    u64::try_from(raw).map_err(|_| libc::EINVAL)
}

/// Apply the caller's umask to a requested mode.
pub fn masked_mode(mode: u32, umask: u32) -> u32 {
    mode & !umask & 0o7777
}
