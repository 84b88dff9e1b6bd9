//! Ignite launcher binary.
//!
//! Bootstraps the process (startup diagnostics plus terminal handlers) and
//! then stays armed until one of the handlers ends it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use init::{package_descriptor, Bootstrap, BootstrapConfig, PackageDescriptor, SystemHost};
use nix::sys::signal::{raise, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ignite",
    about = "Process bootstrap shim - startup diagnostics and terminal handlers",
    version,
    author
)]
struct Cli {
    /// Bootstrap configuration file (TOML)
    #[arg(short, long, env = "IGNITE_CONFIG")]
    config: Option<PathBuf>,

    /// Read the package name from this manifest (Cargo.toml or package.json)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Initialize and wait for a terminal event
    Arm,

    /// Initialize, print startup diagnostics and exit
    Diagnostics,

    /// Initialize and deliberately trigger one terminal handler
    Trip {
        /// Which handler to trigger
        #[arg(value_enum)]
        kind: TripKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TripKind {
    /// Raise SIGINT against ourselves
    Interrupt,
    /// Panic on the main task
    Panic,
    /// Panic inside `catch_unwind`; still counts as uncaught
    CaughtPanic,
    /// Fail a detached task
    Reject,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BootstrapConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BootstrapConfig::default(),
    };

    let package = load_package(cli.manifest.as_ref().or(config.manifest_path.as_ref()))?;
    debug!(package = %package.name, "Resolved package descriptor");

    let host = Arc::new(SystemHost::from_current_runtime()?);
    Bootstrap::new(Arc::clone(&host), package, config).initialize();

    match cli.command.unwrap_or(Commands::Arm) {
        Commands::Arm => {
            info!("Bootstrap handlers armed");
            std::future::pending::<()>().await;
        }

        Commands::Diagnostics => {}

        Commands::Trip { kind } => {
            info!(kind = ?kind, "Tripping terminal handler");
            trip(&host, kind)?;
            std::future::pending::<()>().await;
        }
    }

    Ok(())
}

/// Resolve the package descriptor, preferring a manifest on disk.
fn load_package(manifest: Option<&PathBuf>) -> Result<PackageDescriptor> {
    match manifest {
        Some(path) => PackageDescriptor::from_manifest(path)
            .with_context(|| format!("Failed to read manifest {}", path.display())),
        None => Ok(package_descriptor!()),
    }
}

/// Trigger the handler for `kind`. The handler ends the process.
fn trip(host: &SystemHost, kind: TripKind) -> Result<()> {
    match kind {
        TripKind::Interrupt => {
            raise(Signal::SIGINT).context("Failed to raise SIGINT")?;
        }
        TripKind::Panic => {
            panic!("tripped uncaught error handler");
        }
        TripKind::CaughtPanic => {
            let caught = std::panic::catch_unwind(|| {
                panic!("tripped caught panic");
            });
            debug!(caught = caught.is_err(), "Panic was caught after the hook ran");
        }
        TripKind::Reject => {
            host.spawn_detached("trip", async {
                Err::<(), _>(anyhow::anyhow!("tripped unhandled rejection handler"))
            });
        }
    }
    Ok(())
}
