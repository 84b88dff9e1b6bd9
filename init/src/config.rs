//! Bootstrap configuration.
//!
//! Every field has a default, so an empty (or missing) config file yields
//! the stock behaviour: `NODE_ENV` / `NODE_OPTIONS` lookups, the build-time
//! package descriptor, and exit status 1 from every terminal handler.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default variable holding the runtime environment name.
pub const DEFAULT_ENVIRONMENT_VAR: &str = "NODE_ENV";

/// Default variable holding extra runtime options.
pub const DEFAULT_OPTIONS_VAR: &str = "NODE_OPTIONS";

/// Exit status used by every terminal handler unless overridden.
pub const DEFAULT_EXIT_CODE: i32 = 1;

/// Exit status per terminal handler category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitCodes {
    /// Interrupt signal received
    pub interrupt: i32,
    /// Uncaught error (panic)
    pub uncaught: i32,
    /// Unhandled rejection from a detached task
    pub rejection: i32,
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            interrupt: DEFAULT_EXIT_CODE,
            uncaught: DEFAULT_EXIT_CODE,
            rejection: DEFAULT_EXIT_CODE,
        }
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Variable read for the "environment" startup line
    pub environment_var: String,
    /// Variable appended to the startup options line
    pub options_var: String,
    /// Manifest to read the package name from instead of the build-time one
    pub manifest_path: Option<PathBuf>,
    /// Exit status per terminal handler
    pub exit_codes: ExitCodes,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            environment_var: DEFAULT_ENVIRONMENT_VAR.to_string(),
            options_var: DEFAULT_OPTIONS_VAR.to_string(),
            manifest_path: None,
            exit_codes: ExitCodes::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the handlers cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.environment_var.trim().is_empty() {
            return Err(Error::ConfigError(
                "environment_var must not be empty".to_string(),
            ));
        }
        if self.options_var.trim().is_empty() {
            return Err(Error::ConfigError("options_var must not be empty".to_string()));
        }

        let codes = [
            ("interrupt", self.exit_codes.interrupt),
            ("uncaught", self.exit_codes.uncaught),
            ("rejection", self.exit_codes.rejection),
        ];
        for (name, code) in codes {
            // A terminal handler must never report success.
            if !(1..=255).contains(&code) {
                return Err(Error::ConfigError(format!(
                    "exit_codes.{} must be between 1 and 255, got {}",
                    name, code
                )));
            }
        }

        Ok(())
    }
}
