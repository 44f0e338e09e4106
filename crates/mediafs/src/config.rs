//! Mount configuration: which volume serves which prefix.
//!
//! ```json
//! {
//!   "mounts": [
//!     { "prefix": "sd",  "root": "/mnt/sd" },
//!     { "prefix": "ram", "memory": true, "capacity": 1048576 }
//!   ]
//! }
//! ```
//!
//! A mount is either a host directory (`root`) or a RAM disk (`memory`,
//! optionally sized with `capacity` in bytes).
//! Prefixes must be non-empty and must not contain `://`. When a prefix is
//! listed twice the later mount wins.

use std::path::{Path, PathBuf};

use platform::config::{DEFAULT_PREFIX, DEFAULT_RAM_CAPACITY};
use platform::{LocalFileStorage, MemoryStorage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::Volume;
use crate::router::{BackendRegistry, StorageRouter, PREFIX_SEPARATOR};

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`RouterConfig`].
    #[error("invalid mount configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A mount names neither or both of `root` and `memory`, or gives a
    /// directory mount a `capacity`.
    #[error("mount {0} must set exactly one of \"root\" or \"memory\" (capacity applies to memory only)")]
    InvalidMount(String),
    /// A prefix is empty or contains the `://` separator.
    #[error("invalid mount prefix \"{0}\"")]
    InvalidPrefix(String),
}

/// One prefix → volume binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Address prefix, without `://`
    pub prefix: String,
    /// Host directory backing the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Back the volume with RAM instead of a directory
    #[serde(default, skip_serializing_if = "is_false")]
    pub memory: bool,
    /// Size of a RAM disk in bytes; [`DEFAULT_RAM_CAPACITY`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl MountConfig {
    /// Host directory mount.
    pub fn directory(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: Some(root.into()),
            memory: false,
            capacity: None,
        }
    }

    /// RAM disk mount.
    pub fn memory(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            root: None,
            memory: true,
            capacity: None,
        }
    }

    /// RAM disk mount holding at most `capacity` bytes.
    pub fn memory_with_capacity(prefix: impl Into<String>, capacity: u64) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::memory(prefix)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() || self.prefix.contains(PREFIX_SEPARATOR) {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        if self.root.is_some() == self.memory || (self.capacity.is_some() && !self.memory) {
            return Err(ConfigError::InvalidMount(self.prefix.clone()));
        }
        Ok(())
    }
}

/// The full mount table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Mounts in registration order
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

impl RouterConfig {
    /// Parse and validate a JSON mount table.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON mount table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// A single directory mount.
    pub fn single(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            mounts: vec![MountConfig::directory(prefix, root)],
        }
    }

    /// `$STORAGE_ROOT` (or the working directory) mounted under `sd`.
    ///
    /// See [`platform::config::STORAGE_ROOT_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        let root = LocalFileStorage::from_env()
            .map_or_else(|| PathBuf::from("."), |volume| volume.root().to_path_buf());
        Self::single(DEFAULT_PREFIX, root)
    }

    /// Check every mount.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mounts.iter().try_for_each(MountConfig::validate)
    }

    /// Build one backend per mount.
    pub fn build_registry(&self) -> Result<BackendRegistry, ConfigError> {
        self.validate()?;
        let mut registry = BackendRegistry::new();
        for mount in &self.mounts {
            if let Some(root) = &mount.root {
                if !root.is_dir() {
                    warn!("mount {}: {} is not a directory", mount.prefix, root.display());
                }
                info!("mounting {}{PREFIX_SEPARATOR} at {}", mount.prefix, root.display());
                registry.add_backend(
                    Box::new(Volume::new(LocalFileStorage::new(root.clone()))),
                    mount.prefix.clone(),
                );
            } else {
                let capacity = mount.capacity.unwrap_or(DEFAULT_RAM_CAPACITY);
                info!("mounting {}{PREFIX_SEPARATOR} in memory ({capacity} bytes)", mount.prefix);
                registry.add_backend(
                    Box::new(Volume::new(MemoryStorage::with_capacity(capacity))),
                    mount.prefix.clone(),
                );
            }
        }
        Ok(registry)
    }

    /// Build a router over [`build_registry`](Self::build_registry).
    pub fn build_router(&self) -> Result<StorageRouter, ConfigError> {
        self.build_registry().map(StorageRouter::new)
    }
}
