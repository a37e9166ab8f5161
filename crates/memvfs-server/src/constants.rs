//! Launcher configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Filesystem name shown in the mount table.
pub const DEFAULT_FS_NAME: &str = "memvfs";

/// Permission bits for `/` on a fresh mount.
pub const DEFAULT_ROOT_MODE: u32 = 0o755;

/// How long the kernel may cache attributes and entries, in seconds.
pub const DEFAULT_ATTR_TTL_SECS: u64 = 1;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MEMVFS_CONFIG";

/// Inode number the kernel uses for the mount root.
pub const ROOT_INO: u64 = 1;

/// Block size reported in file attributes.
pub const ATTR_BLKSIZE: u32 = 512;
