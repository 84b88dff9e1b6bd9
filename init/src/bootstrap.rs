//! Bootstrap initializer - startup diagnostics and terminal handlers.
//!
//! [`Bootstrap::initialize`] writes four diagnostic lines about the process
//! and arms three terminal handlers on the host:
//!
//! - `SIGINT` - logs the signal name and exits
//! - uncaught errors - logs the fault and its origin and exits
//! - unhandled task failures - logs the task and the reason and exits
//!
//! Every handler ends in termination; nothing here recovers.

use crate::config::BootstrapConfig;
use crate::fault::Fault;
use crate::host::{HostProcess, TaskHandle};
use crate::manifest::PackageDescriptor;
use nix::sys::signal::Signal;
use std::sync::Arc;
use tracing::debug;

/// Separator between entries of the startup options line.
pub const OPTIONS_SEPARATOR: &str = " | ";

/// Format the launch announcement.
pub fn launch_line(title: &str, pid: u32) -> String {
    format!("Main process launched [{} :: {}]", title, pid)
}

/// Format the startup options line.
///
/// `extra` is appended as a single entry when present, even if empty.
pub fn options_line(args: &[String], extra: Option<String>) -> String {
    let mut options = args.to_vec();
    options.extend(extra);
    format!("Node.js process options: {}", options.join(OPTIONS_SEPARATOR))
}

/// Process bootstrap bound to a host.
pub struct Bootstrap<H: HostProcess + 'static> {
    host: Arc<H>,
    package: PackageDescriptor,
    config: BootstrapConfig,
}

impl<H: HostProcess + 'static> Bootstrap<H> {
    /// Create a new bootstrap.
    pub fn new(host: Arc<H>, package: PackageDescriptor, config: BootstrapConfig) -> Self {
        Self {
            host,
            package,
            config,
        }
    }

    /// Get a reference to the host.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// The package being bootstrapped.
    pub fn package(&self) -> &PackageDescriptor {
        &self.package
    }

    /// The four startup diagnostic lines, in emission order.
    pub fn startup_lines(&self) -> Vec<String> {
        let host = &self.host;
        let environment = host.env_var(&self.config.environment_var).unwrap_or_default();

        vec![
            launch_line(&host.title(), host.pid()),
            format!("Process name: {}", self.package.name),
            format!("Node.js environment: {}", environment),
            options_line(&host.startup_args(), host.env_var(&self.config.options_var)),
        ]
    }

    /// Emit startup diagnostics and arm the terminal handlers.
    ///
    /// Diagnostics are written on every call. Handlers are registered
    /// once per host; later calls leave the existing registrations alone.
    pub fn initialize(&self) {
        for line in self.startup_lines() {
            self.host.write_line(&line);
        }

        if !self.host.claim_initialization() {
            debug!("Terminal handlers already registered, skipping");
            return;
        }

        self.register_interrupt();
        self.register_uncaught_error();
        self.register_unhandled_rejection();

        debug!(
            package = %self.package.name,
            exit_codes = ?self.config.exit_codes,
            "Terminal handlers registered"
        );
    }

    fn register_interrupt(&self) {
        let host = Arc::clone(&self.host);
        let code = self.config.exit_codes.interrupt;

        self.host.on_signal(
            Signal::SIGINT,
            Arc::new(move |signal: Signal| {
                host.write_line(&format!("Received signal: {}", signal.as_str()));
                host.terminate(code);
            }),
        );
    }

    fn register_uncaught_error(&self) {
        let host = Arc::clone(&self.host);
        let code = self.config.exit_codes.uncaught;

        self.host.on_uncaught_error(Arc::new(move |fault: &Fault, origin: &str| {
            host.write_line(&format!("Uncaught exception: {}", fault));
            host.write_line(&format!("Exception origin: {}", origin));
            host.terminate(code);
        }));
    }

    fn register_unhandled_rejection(&self) {
        let host = Arc::clone(&self.host);
        let code = self.config.exit_codes.rejection;

        self.host
            .on_unhandled_rejection(Arc::new(move |reason: &Fault, task: &TaskHandle| {
                host.write_line(&format!(
                    "Unhandled promise rejection at promise: {}",
                    task.to_json()
                ));
                host.write_line(&format!("Reason:\n{}", reason));
                host.terminate(code);
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExitCodes;
    use crate::testing::FakeHost;
    use pretty_assertions::assert_eq;

    fn bootstrap(host: FakeHost) -> Bootstrap<FakeHost> {
        Bootstrap::new(
            Arc::new(host),
            PackageDescriptor::new("demo-app"),
            BootstrapConfig::default(),
        )
    }

    fn task() -> TaskHandle {
        TaskHandle {
            id: 1,
            name: "worker".to_string(),
        }
    }

    #[test]
    fn test_initialize_returns_unit() {
        let boot = bootstrap(FakeHost::new());
        let () = boot.initialize();
        assert!(boot.host().exits().is_empty());
    }

    #[test]
    fn test_startup_lines() {
        let host = FakeHost::new()
            .with_title("ignite")
            .with_pid(77)
            .with_env("NODE_ENV", "production")
            .with_env("NODE_OPTIONS", "--max-old-space-size=512")
            .with_args(["--verbose", "--trace"]);
        let boot = bootstrap(host);
        boot.initialize();

        assert_eq!(
            boot.host().lines(),
            vec![
                "Main process launched [ignite :: 77]",
                "Process name: demo-app",
                "Node.js environment: production",
                "Node.js process options: --verbose | --trace | --max-old-space-size=512",
            ]
        );
    }

    #[test]
    fn test_startup_lines_with_empty_environment() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let lines = boot.host().lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "Node.js environment: ");
        assert_eq!(lines[3], "Node.js process options: ");
    }

    #[test]
    fn test_options_line() {
        let args = vec!["--a".to_string(), "--b".to_string()];
        assert_eq!(options_line(&args, None), "Node.js process options: --a | --b");
        assert_eq!(
            options_line(&args, Some("--c".to_string())),
            "Node.js process options: --a | --b | --c"
        );
        // A set but empty variable still contributes an entry.
        assert_eq!(
            options_line(&args, Some(String::new())),
            "Node.js process options: --a | --b | "
        );
        assert_eq!(options_line(&[], Some("--c".to_string())), "Node.js process options: --c");
    }

    #[test]
    fn test_custom_variable_names() {
        let host = FakeHost::new()
            .with_env("NODE_ENV", "ignored")
            .with_env("APP_ENV", "staging")
            .with_env("APP_OPTS", "--fast");
        let config = BootstrapConfig {
            environment_var: "APP_ENV".to_string(),
            options_var: "APP_OPTS".to_string(),
            ..Default::default()
        };
        let boot = Bootstrap::new(Arc::new(host), PackageDescriptor::new("demo-app"), config);
        boot.initialize();

        let lines = boot.host().lines();
        assert_eq!(lines[2], "Node.js environment: staging");
        assert_eq!(lines[3], "Node.js process options: --fast");
    }

    #[test]
    fn test_registers_one_handler_per_category() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let host = boot.host();
        assert_eq!(host.signal_handler_count(Signal::SIGINT), 1);
        assert_eq!(host.error_handler_count(), 1);
        assert_eq!(host.rejection_handler_count(), 1);
        assert!(host.exits().is_empty());
    }

    #[test]
    fn test_interrupt_exits() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let host = boot.host();
        host.fire_signal(Signal::SIGINT);

        assert!(host.lines().contains(&"Received signal: SIGINT".to_string()));
        assert_eq!(host.exits(), vec![1]);
    }

    #[test]
    fn test_other_signals_are_not_handled() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let host = boot.host();
        host.fire_signal(Signal::SIGTERM);

        assert_eq!(host.lines().len(), 4);
        assert!(host.exits().is_empty());
    }

    #[test]
    fn test_uncaught_error_exits() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let host = boot.host();
        host.fire_uncaught(&Fault::from("test error"), "unhandledException");

        let lines = host.lines();
        assert_eq!(
            &lines[4..],
            &[
                "Uncaught exception: test error".to_string(),
                "Exception origin: unhandledException".to_string(),
            ]
        );
        assert_eq!(host.exits(), vec![1]);
    }

    #[test]
    fn test_unhandled_rejection_exits() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();

        let host = boot.host();
        host.fire_rejection(&Fault::from("some reason"), &task());

        let lines = host.lines();
        assert_eq!(
            &lines[4..],
            &[
                r#"Unhandled promise rejection at promise: {"id":1,"name":"worker"}"#.to_string(),
                "Reason:\nsome reason".to_string(),
            ]
        );
        assert_eq!(host.exits(), vec![1]);
    }

    #[test]
    fn test_configured_exit_codes() {
        let config = BootstrapConfig {
            exit_codes: ExitCodes {
                interrupt: 130,
                uncaught: 70,
                rejection: 71,
            },
            ..Default::default()
        };
        let boot = Bootstrap::new(
            Arc::new(FakeHost::new()),
            PackageDescriptor::new("demo-app"),
            config,
        );
        boot.initialize();

        let host = boot.host();
        host.fire_signal(Signal::SIGINT);
        host.fire_uncaught(&Fault::from("x"), "panic");
        host.fire_rejection(&Fault::from("y"), &task());

        assert_eq!(host.exits(), vec![130, 70, 71]);
    }

    #[test]
    fn test_repeated_initialize_registers_once() {
        let boot = bootstrap(FakeHost::new());
        boot.initialize();
        boot.initialize();

        let host = boot.host();
        assert_eq!(host.lines().len(), 8);
        assert_eq!(
            host.lines()
                .iter()
                .filter(|l| l.starts_with("Main process launched"))
                .count(),
            2
        );
        assert_eq!(host.signal_handler_count(Signal::SIGINT), 1);
        assert_eq!(host.error_handler_count(), 1);
        assert_eq!(host.rejection_handler_count(), 1);

        host.fire_signal(Signal::SIGINT);
        assert_eq!(host.exits(), vec![1]);
    }

    #[test]
    fn test_separate_bootstraps_share_host_guard() {
        let host = Arc::new(FakeHost::new());
        let first = Bootstrap::new(
            Arc::clone(&host),
            PackageDescriptor::new("first"),
            BootstrapConfig::default(),
        );
        let second = Bootstrap::new(
            Arc::clone(&host),
            PackageDescriptor::new("second"),
            BootstrapConfig::default(),
        );
        first.initialize();
        second.initialize();

        let lines = host.lines();
        assert_eq!(lines[1], "Process name: first");
        assert_eq!(lines[5], "Process name: second");
        assert_eq!(host.error_handler_count(), 1);
    }
}
