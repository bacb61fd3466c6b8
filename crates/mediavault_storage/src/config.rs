//! Storage configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from mediavault.toml)
//! - ~/.config/mediavault/mediavault.toml
//! - ./mediavault.toml
//! - `MEDIAVAULT_*` environment variables

use config::{Config, Environment, File, FileFormat};
use mediavault_error::{ConfigError, MediavaultError, MediavaultResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Where blobs live and how large an upload may grow.
///
/// # Example
///
/// ```toml
/// base_path = "/var/lib/mediavault"
/// max_file_size_bytes = 10485760
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StorageConfig {
    /// Directory holding the sharded blobs and the `tmp/` staging area.
    base_path: PathBuf,

    /// Uploads are truncated to this many bytes (default 10 MiB).
    #[serde(default = "default_max_file_size_bytes")]
    max_file_size_bytes: u64,
}

fn default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024
}

impl StorageConfig {
    /// Build a configuration directly.
    pub fn new(base_path: impl Into<PathBuf>, max_file_size_bytes: u64) -> Self {
        Self {
            base_path: base_path.into(),
            max_file_size_bytes,
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MediavaultResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                MediavaultError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                MediavaultError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> MediavaultResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../mediavault.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/mediavault/mediavault.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("mediavault").required(false))
            .add_source(Environment::with_prefix("MEDIAVAULT").try_parsing(true));

        let config: Self = builder
            .build()
            .map_err(|e| {
                MediavaultError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                MediavaultError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no store can run with.
    ///
    /// # Errors
    ///
    /// Returns an error if the base path is empty or the size limit is zero.
    pub fn validate(&self) -> MediavaultResult<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::new("base_path must not be empty").into());
        }
        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::new("max_file_size_bytes must be positive").into());
        }
        Ok(())
    }
}
