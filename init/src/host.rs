//! The host process capability.
//!
//! The bootstrap never touches the process directly. It talks to a
//! [`HostProcess`], which the binary wires to the real process
//! ([`SystemHost`](crate::system::SystemHost)) and tests wire to
//! [`FakeHost`](crate::testing::FakeHost).

use crate::fault::Fault;
use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback for a delivered signal.
pub type SignalHandler = Arc<dyn Fn(Signal) + Send + Sync>;

/// Callback for an uncaught error: the fault and a description of its origin.
pub type ErrorHandler = Arc<dyn Fn(&Fault, &str) + Send + Sync>;

/// Callback for a detached task that failed with nobody observing it.
pub type RejectionHandler = Arc<dyn Fn(&Fault, &TaskHandle) + Send + Sync>;

/// Lock a handler list, ignoring poisoning from a panicking handler.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity of a detached task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Sequence number, unique per host
    pub id: u64,
    /// Name given at spawn time
    pub name: String,
}

impl TaskHandle {
    /// Serialize the handle for diagnostics.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Narrow view of the running process needed to bootstrap it.
pub trait HostProcess: Send + Sync {
    /// Process display title.
    fn title(&self) -> String;

    /// Numeric process identifier.
    fn pid(&self) -> u32;

    /// Look up an environment variable.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Arguments the process was launched with, excluding the program name.
    fn startup_args(&self) -> Vec<String>;

    /// Write one line to the error stream.
    fn write_line(&self, line: &str);

    /// Register a handler for `signal`.
    fn on_signal(&self, signal: Signal, handler: SignalHandler);

    /// Register the handler for uncaught errors.
    fn on_uncaught_error(&self, handler: ErrorHandler);

    /// Register the handler for unhandled task failures.
    fn on_unhandled_rejection(&self, handler: RejectionHandler);

    /// Request termination with `code`.
    ///
    /// The real host never returns from this; fakes do.
    fn terminate(&self, code: i32);

    /// Claim the one-time initialization slot.
    ///
    /// Returns `true` for the first caller only.
    fn claim_initialization(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_handle_json() {
        let handle = TaskHandle {
            id: 3,
            name: "sync".to_string(),
        };
        assert_eq!(handle.to_json(), r#"{"id":3,"name":"sync"}"#);
    }
}
