//! Mount configuration.
//!
//! Loaded from a RON file: `$MEMVFS_CONFIG` if set, otherwise
//! `~/.config/memvfs/config.ron` if present, otherwise built-in defaults.
//!
//! ```ron
//! (
//!     fs_name: "scratch",
//!     allow_other: true,
//!     attr_ttl_secs: 5,
//!     log_filter: Some("memvfs_kernel=debug,info"),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_ATTR_TTL_SECS, DEFAULT_FS_NAME, DEFAULT_ROOT_MODE,
};

/// Settings for one mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Filesystem name shown in the mount table.
    pub fs_name: String,
    /// Unmount automatically when the process exits.
    pub auto_unmount: bool,
    /// Let users other than the mounting one see the tree.
    pub allow_other: bool,
    /// Kernel attribute/entry cache lifetime.
    pub attr_ttl_secs: u64,
    /// Permission bits for `/`.
    pub root_mode: u32,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: DEFAULT_FS_NAME.to_string(),
            auto_unmount: true,
            allow_other: false,
            attr_ttl_secs: DEFAULT_ATTR_TTL_SECS,
            root_mode: DEFAULT_ROOT_MODE,
            log_filter: None,
        }
    }
}

/// Where the active config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Error type for config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl MountConfig {
    /// Default config file path (`~/.config/memvfs/config.ron`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("memvfs").join("config.ron"))
    }

    /// Parse a RON document. Missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Resolve the config the launcher should use.
    ///
    /// An explicitly named file must load; a missing default file just
    /// means defaults. Runs before logging is set up, so the caller reports
    /// the returned source.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::resolve(explicit.as_deref(), Self::default_path().as_deref())
    }

    fn resolve(
        explicit: Option<&Path>,
        fallback: Option<&Path>,
    ) -> Result<(Self, ConfigSource), ConfigError> {
        let path = match (explicit, fallback) {
            (Some(path), _) => path,
            (None, Some(path)) if path.exists() => path,
            _ => return Ok((Self::default(), ConfigSource::Defaults)),
        };
        let config = Self::load_from(path)?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Attribute cache lifetime as a [`Duration`].
    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_ttl_secs)
    }
}
