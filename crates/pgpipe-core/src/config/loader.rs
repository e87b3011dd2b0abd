//! Configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (~/.pgpipe/config.yaml, or an explicit path)
//! 3. Environment variables (PGPIPE_* prefix)
//! 4. CLI flags (handled by caller)

use super::RuntimeConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Runtime configuration loader
pub struct ConfigLoader {
    /// Config file to read, if any
    path: Option<Utf8PathBuf>,

    /// Whether a missing file is an error
    required: bool,
}

impl ConfigLoader {
    /// Loader reading the optional user config file (~/.pgpipe/config.yaml)
    pub fn new() -> Self {
        let path = dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(".pgpipe").join(CONFIG_FILE_NAME));
        Self {
            path,
            required: false,
        }
    }

    /// Loader reading an explicit config file, which must exist
    pub fn with_file(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            required: true,
        }
    }

    /// Loader ignoring config files, applying only defaults and environment
    pub fn defaults_only() -> Self {
        Self {
            path: None,
            required: false,
        }
    }

    /// Load runtime configuration with precedence applied, then validate it
    pub fn load(&self) -> Result<RuntimeConfig> {
        let mut config = match &self.path {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path);
                Self::load_yaml_file(path)?
            }
            Some(path) if self.required => return Err(Error::config_not_found(path.as_str())),
            _ => RuntimeConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<RuntimeConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read {}", path), e))?;
        if content.trim().is_empty() {
            return Ok(RuntimeConfig::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<()> {
        if let Ok(val) = env::var("PGPIPE_BIN_ROOT") {
            config.toolchain.bin_root = Utf8PathBuf::from(val);
        }

        if let Some(val) = parse_env("PGPIPE_STREAM_CHANNEL_CAPACITY")? {
            config.stream.channel_capacity = val;
        }

        if let Some(val) = parse_env("PGPIPE_STREAM_CHUNK_SIZE")? {
            config.stream.chunk_size = val;
        }

        if let Some(val) = parse_env("PGPIPE_FETCH_TIMEOUT_SECS")? {
            config.network.fetch_timeout_secs = val;
        }

        if let Some(val) = parse_env("PGPIPE_CONNECT_TIMEOUT_SECS")? {
            config.network.connect_timeout_secs = val;
        }

        if let Ok(val) = env::var("PGPIPE_WORKSPACE_ROOT") {
            config.restore.workspace_root = Some(Utf8PathBuf::from(val));
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name))),
        Err(_) => Ok(None),
    }
}
