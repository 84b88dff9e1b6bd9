//! Package descriptor - the distributable's declared name.
//!
//! The descriptor is normally captured at build time from the calling
//! crate's Cargo manifest with [`package_descriptor!`](crate::package_descriptor).
//! A manifest on disk (`Cargo.toml` or `package.json`) can be read instead.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Build a [`PackageDescriptor`] from the calling crate's Cargo manifest.
#[macro_export]
macro_rules! package_descriptor {
    () => {
        $crate::PackageDescriptor::new(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
    };
}

/// Read-only identity of the distributable being bootstrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Declared package name
    pub name: String,
    /// Declared version, when the manifest has one
    pub version: Option<String>,
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<NamedEntry>,
}

#[derive(Deserialize)]
struct NamedEntry {
    name: Option<String>,
    version: Option<toml::Value>,
}

#[derive(Deserialize)]
struct NpmManifest {
    name: Option<String>,
    version: Option<String>,
}

impl PackageDescriptor {
    /// Create a descriptor with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Attach a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Load a descriptor from a manifest file.
    ///
    /// A file named `package.json` is parsed as JSON and must carry a
    /// top-level `name`; anything else is parsed as a Cargo manifest and
    /// must carry `[package].name`.
    pub fn from_manifest(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .file_name()
            .map(|name| name == "package.json")
            .unwrap_or(false);

        let (name, version) = if is_json {
            let manifest: NpmManifest = serde_json::from_str(&content)?;
            (manifest.name, manifest.version)
        } else {
            let manifest: CargoManifest = toml::from_str(&content)?;
            match manifest.package {
                // Workspace-inherited versions (`version.workspace = true`) are tables.
                Some(entry) => (
                    entry.name,
                    entry.version.and_then(|v| v.as_str().map(str::to_string)),
                ),
                None => {
                    return Err(Error::Manifest {
                        path: path.to_path_buf(),
                        reason: "missing [package] table".to_string(),
                    })
                }
            }
        };

        let name = name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::Manifest {
                path: path.to_path_buf(),
                reason: "missing package name".to_string(),
            })?;

        Ok(Self { name, version })
    }
}
