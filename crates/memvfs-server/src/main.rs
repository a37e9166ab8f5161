//! memvfs binary
//!
//! Mounts an empty in-memory filesystem and serves it until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! memvfs /mnt/scratch
//! RUST_LOG=memvfs_kernel=debug memvfs /mnt/scratch
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use memvfs_server::cli::{self, Command};
use memvfs_server::MountConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("{}", cli::usage("memvfs"));
}

fn init_tracing(config: &MountConfig) {
    let fallback = config.log_filter.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let mountpoint = match cli::parse_args(env::args_os().skip(1)) {
        Ok(Command::Mount(path)) => path,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let (config, source) = match MountConfig::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);
    tracing::info!(source = %source, "config loaded");

    match serve(mountpoint, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_mountpoint(mountpoint: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(
        mountpoint.is_dir(),
        "mount point {} is not an existing directory",
        mountpoint.display()
    );
    Ok(())
}

#[cfg(feature = "fuse")]
async fn serve(mountpoint: PathBuf, config: MountConfig) -> anyhow::Result<()> {
    use anyhow::Context;
    use memvfs_kernel::MemoryFs;
    use std::sync::Arc;

    check_mountpoint(&mountpoint)?;

    let fs = Arc::new(MemoryFs::with_root_mode(config.root_mode));
    let session = memvfs_server::spawn_mount(Arc::clone(&fs), &mountpoint, &config)
        .with_context(|| format!("failed to mount at {}", mountpoint.display()))?;

    tracing::info!(
        mountpoint = %mountpoint.display(),
        fs_name = %config.fs_name,
        "memvfs mounted, Ctrl-C to unmount"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    tracing::info!(entries = fs.entry_count(), "unmounting");
    drop(session);
    Ok(())
}

#[cfg(not(feature = "fuse"))]
async fn serve(mountpoint: PathBuf, _config: MountConfig) -> anyhow::Result<()> {
    check_mountpoint(&mountpoint)?;
    anyhow::bail!("memvfs was built without the `fuse` feature")
}
