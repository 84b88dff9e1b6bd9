//! In-memory host for exercising a bootstrap without touching the process.
//!
//! `FakeHost` records every line written, every handler registered and
//! every termination request, and lets callers fire the registered
//! handlers by hand.

use crate::fault::Fault;
use crate::host::{
    lock, ErrorHandler, HostProcess, RejectionHandler, SignalHandler, TaskHandle,
};
use nix::sys::signal::Signal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Recording host process.
pub struct FakeHost {
    title: String,
    pid: u32,
    env: HashMap<String, String>,
    args: Vec<String>,
    lines: Mutex<Vec<String>>,
    signal_handlers: Mutex<Vec<(Signal, SignalHandler)>>,
    error_handlers: Mutex<Vec<ErrorHandler>>,
    rejection_handlers: Mutex<Vec<RejectionHandler>>,
    exits: Mutex<Vec<i32>>,
    initialized: AtomicBool,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Host titled `fake` with pid 4242, no environment and no arguments.
    pub fn new() -> Self {
        Self {
            title: "fake".to_string(),
            pid: 4242,
            env: HashMap::new(),
            args: Vec::new(),
            lines: Mutex::new(Vec::new()),
            signal_handlers: Mutex::new(Vec::new()),
            error_handlers: Mutex::new(Vec::new()),
            rejection_handlers: Mutex::new(Vec::new()),
            exits: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Set the process title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the process id.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Set the startup arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Lines written to the error stream so far.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Termination codes requested so far.
    pub fn exits(&self) -> Vec<i32> {
        lock(&self.exits).clone()
    }

    /// Number of handlers registered for `signal`.
    pub fn signal_handler_count(&self, signal: Signal) -> usize {
        lock(&self.signal_handlers)
            .iter()
            .filter(|(s, _)| *s == signal)
            .count()
    }

    /// Number of uncaught error handlers registered.
    pub fn error_handler_count(&self) -> usize {
        lock(&self.error_handlers).len()
    }

    /// Number of rejection handlers registered.
    pub fn rejection_handler_count(&self) -> usize {
        lock(&self.rejection_handlers).len()
    }

    /// Deliver `signal` to every handler registered for it.
    pub fn fire_signal(&self, signal: Signal) {
        let handlers: Vec<SignalHandler> = lock(&self.signal_handlers)
            .iter()
            .filter(|(s, _)| *s == signal)
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(signal);
        }
    }

    /// Deliver an uncaught error to every registered handler.
    pub fn fire_uncaught(&self, fault: &Fault, origin: &str) {
        let handlers = lock(&self.error_handlers).clone();
        for handler in handlers {
            handler(fault, origin);
        }
    }

    /// Deliver an unhandled task failure to every registered handler.
    pub fn fire_rejection(&self, fault: &Fault, task: &TaskHandle) {
        let handlers = lock(&self.rejection_handlers).clone();
        for handler in handlers {
            handler(fault, task);
        }
    }
}

impl HostProcess for FakeHost {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn startup_args(&self) -> Vec<String> {
        self.args.clone()
    }

    fn write_line(&self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }

    fn on_signal(&self, signal: Signal, handler: SignalHandler) {
        lock(&self.signal_handlers).push((signal, handler));
    }

    fn on_uncaught_error(&self, handler: ErrorHandler) {
        lock(&self.error_handlers).push(handler);
    }

    fn on_unhandled_rejection(&self, handler: RejectionHandler) {
        lock(&self.rejection_handlers).push(handler);
    }

    fn terminate(&self, code: i32) {
        lock(&self.exits).push(code);
    }

    fn claim_initialization(&self) -> bool {
        !self.initialized.swap(true, Ordering::SeqCst)
    }
}
