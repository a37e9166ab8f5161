//! # memvfs-server
//!
//! Mounts a [`memvfs_kernel::MemoryFs`] through FUSE.
//!
//! - [`cli`]: argument parsing for the `memvfs` binary
//! - [`config`]: RON mount configuration
//! - [`inodes`]: inode ↔ path table for the adapter
//! - [`translate`]: errno and open-flag translation
//! - `fuse`: the `fuser::Filesystem` adapter (feature `fuse`)

pub mod cli;
pub mod config;
pub mod constants;
pub mod fuse;
pub mod inodes;
pub mod translate;

pub use config::{ConfigError, ConfigSource, MountConfig};
#[cfg(feature = "fuse")]
pub use fuse::{spawn_mount, MemVfsFuse};
