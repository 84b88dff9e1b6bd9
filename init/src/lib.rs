//! Ignite bootstrap initializer.
//!
//! Run once, first thing in `main`, to:
//!
//! - Write startup diagnostics about the process to stderr
//! - Arm a `SIGINT` handler
//! - Arm an uncaught error (panic) handler
//! - Arm an unhandled task failure handler
//!
//! Every handler logs what happened and terminates the process.
//!
//! # Architecture
//!
//! - **Bootstrap**: formats the diagnostics and registers the handlers
//! - **HostProcess**: the capability the bootstrap works through
//! - **SystemHost**: the real process (tokio signals, panic hook)
//! - **FakeHost**: a recording host for tests
//!
//! # Example
//!
//! ```no_run
//! use ignite_init::{package_descriptor, Bootstrap, BootstrapConfig, SystemHost};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Arc::new(SystemHost::from_current_runtime()?);
//!     Bootstrap::new(host, package_descriptor!(), BootstrapConfig::default()).initialize();
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fault;
pub mod host;
pub mod manifest;
pub mod system;
pub mod testing;

// Re-export main types
pub use bootstrap::Bootstrap;
pub use config::{BootstrapConfig, ExitCodes};
pub use error::{Error, Result};
pub use fault::Fault;
pub use host::{ErrorHandler, HostProcess, RejectionHandler, SignalHandler, TaskHandle};
pub use manifest::PackageDescriptor;
pub use system::SystemHost;
