//! Command-line parsing for the `memvfs` launcher.
//!
//! The launcher takes exactly one argument, the mount point. Anything else
//! is a usage error (exit code 1).

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// What the launcher was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mount a fresh filesystem at the given path.
    Mount(PathBuf),
    /// Print usage and exit successfully.
    Help,
}

/// Wrong invocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing mount point")]
    MissingMountPoint,
    #[error("expected exactly one mount point, got {0} arguments")]
    TooManyArguments(usize),
}

/// Parse the arguments that follow the program name.
pub fn parse_args<I>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match args.as_slice() {
        [] => Err(UsageError::MissingMountPoint),
        [only] if only == "--help" || only == "-h" => Ok(Command::Help),
        [only] => Ok(Command::Mount(PathBuf::from(only))),
        _ => Err(UsageError::TooManyArguments(args.len())),
    }
}

/// Usage text for the launcher.
pub fn usage(program: &str) -> String {
    format!(
        r#"{program} - in-memory filesystem over FUSE

USAGE:
    {program} <mountpoint>

Everything written under <mountpoint> lives in process memory and is gone
once the process exits. Press Ctrl-C to unmount.

ENVIRONMENT:
    RUST_LOG                      Log filter (default: info)
    {config_env:<30}Config file (default: ~/.config/memvfs/config.ron)
"#,
        config_env = crate::constants::CONFIG_ENV_VAR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_single_mount_point() {
        assert_eq!(
            parse_args(args(&["/mnt/scratch"])),
            Ok(Command::Mount(PathBuf::from("/mnt/scratch")))
        );
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse_args(args(&[])), Err(UsageError::MissingMountPoint));
    }

    #[test]
    fn test_too_many_arguments() {
        assert_eq!(
            parse_args(args(&["/mnt/a", "/mnt/b"])),
            Err(UsageError::TooManyArguments(2))
        );
        // Help does not rescue an over-long command line
        assert_eq!(
            parse_args(args(&["--help", "/mnt/a"])),
            Err(UsageError::TooManyArguments(2))
        );
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_args(args(&["--help"])), Ok(Command::Help));
        assert_eq!(parse_args(args(&["-h"])), Ok(Command::Help));
    }

    #[test]
    fn test_usage_mentions_program() {
        let text = usage("memvfs");
        assert!(text.contains("memvfs <mountpoint>"));
        assert!(text.contains("MEMVFS_CONFIG"));
    }
}
