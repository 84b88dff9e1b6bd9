//! The real host process.
//!
//! Signals are delivered through tokio signal streams driven by the runtime
//! the host was created on. Uncaught errors are panics, caught by the
//! process panic hook. Unhandled rejections are detached tasks spawned with
//! [`SystemHost::spawn_detached`] that finish with an error.
//!
//! All three are process-wide: every `SystemHost` shares one signal
//! disposition, one panic hook, and one list of rejection handlers.

use crate::error::{Error, Result};
use crate::fault::{panic_origin, Fault};
use crate::host::{
    lock, ErrorHandler, HostProcess, RejectionHandler, SignalHandler, TaskHandle,
};
use nix::sys::signal::Signal;
use std::error::Error as StdError;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::runtime::Handle;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

/// Process-wide initialization flag, shared by every `SystemHost`.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Handlers for detached task failures, shared by every `SystemHost`.
static REJECTION_HANDLERS: Mutex<Vec<RejectionHandler>> = Mutex::new(Vec::new());

/// Next detached task id, unique across hosts.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Host backed by the running process.
pub struct SystemHost {
    /// Runtime that drives signal streams and detached tasks
    runtime: Handle,
}

impl SystemHost {
    /// Create a host bound to the tokio runtime the caller is running on.
    pub fn from_current_runtime() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?;
        Ok(Self::with_handle(runtime))
    }

    /// Create a host bound to an explicit runtime handle.
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Spawn a task whose failure nobody awaits.
    ///
    /// If the task completes with an error, every rejection handler
    /// registered in the process receives the error and the returned
    /// handle, whichever host registered it.
    pub fn spawn_detached<F, E>(&self, name: impl Into<String>, future: F) -> TaskHandle
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>> + Send + 'static,
    {
        let task = TaskHandle {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
        };
        let handle = task.clone();

        debug!(task = %task.name, id = task.id, "Spawning detached task");

        self.runtime.spawn(async move {
            if let Err(err) = future.await {
                let fault = Fault::from_error(err);
                let registered = lock(&REJECTION_HANDLERS).clone();
                if registered.is_empty() {
                    warn!(
                        task = %handle.name,
                        error = %fault,
                        "Detached task failed with no rejection handler registered"
                    );
                }
                for handler in registered {
                    handler(&fault, &handle);
                }
            }
        });

        task
    }
}

impl HostProcess for SystemHost {
    fn title(&self) -> String {
        std::env::args_os()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .or_else(|| {
                std::env::current_exe().ok().and_then(|exe| {
                    exe.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn pid(&self) -> u32 {
        std::process::id()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }

    fn startup_args(&self) -> Vec<String> {
        std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        // Nowhere left to report a failed write to stderr.
        let _ = writeln!(stderr, "{}", line);
    }

    fn on_signal(&self, sig: Signal, handler: SignalHandler) {
        let _guard = self.runtime.enter();

        let mut stream = match signal(SignalKind::from_raw(sig as i32)) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(signal = sig.as_str(), error = %e, "Failed to register signal handler");
                return;
            }
        };

        self.runtime.spawn(async move {
            while stream.recv().await.is_some() {
                handler(sig);
            }
        });

        debug!(signal = sig.as_str(), "Signal handler registered");
    }

    /// Install `handler` as the process panic hook.
    ///
    /// The hook runs before unwinding starts, so it cannot tell whether a
    /// panic would later be caught. Every panic counts as uncaught,
    /// including one inside `catch_unwind` or in a spawned task whose
    /// `JoinError` is awaited.
    fn on_uncaught_error(&self, handler: ErrorHandler) {
        // Replaces the default hook, so the panic message is not printed twice.
        std::panic::set_hook(Box::new(move |info| {
            let fault = Fault::from_panic_payload(info.payload());
            let origin = panic_origin(info.location());
            handler(&fault, &origin);
        }));
    }

    fn on_unhandled_rejection(&self, handler: RejectionHandler) {
        lock(&REJECTION_HANDLERS).push(handler);
    }

    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }

    fn claim_initialization(&self) -> bool {
        !INITIALIZED.swap(true, Ordering::SeqCst)
    }
}
