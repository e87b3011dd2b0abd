//! Runtime configuration
//!
//! These types control operational parameters of the pipeline: where the
//! PostgreSQL client binaries live, the size of the in-memory stream window,
//! HTTP timeouts for archive downloads and where restore workspaces are created.

mod loader;

pub use loader::ConfigLoader;

use crate::error::{Error, Result};
use crate::version::{PgVersion, VersionCapability, DEFAULT_BIN_ROOT};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// PostgreSQL client binaries
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Dump stream sizing
    #[serde(default)]
    pub stream: StreamConfig,

    /// Archive download settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Restore workspace settings
    #[serde(default)]
    pub restore: RestoreConfig,
}

impl RuntimeConfig {
    /// Resolves a version's executables using the configured install root
    pub fn capability(&self, version: PgVersion) -> VersionCapability {
        version.capability_in(&self.toolchain.bin_root)
    }

    /// Rejects values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.stream.channel_capacity == 0 {
            return Err(Error::invalid_config(
                "stream.channel-capacity must be at least 1",
            ));
        }
        if self.stream.chunk_size == 0 {
            return Err(Error::invalid_config("stream.chunk-size must be at least 1"));
        }
        if self.network.fetch_timeout_secs == 0 || self.network.connect_timeout_secs == 0 {
            return Err(Error::invalid_config("network timeouts must be non-zero"));
        }
        if self.restore.workspace_prefix.contains('/') {
            return Err(Error::invalid_config(
                "restore.workspace-prefix must not contain a path separator",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolchainConfig {
    /// Root holding `<version>/bin/pg_dump` and `<version>/bin/psql`
    #[serde(default = "default_bin_root")]
    pub bin_root: Utf8PathBuf,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            bin_root: default_bin_root(),
        }
    }
}

/// Bounded window between a producer task and its reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StreamConfig {
    /// Chunks buffered before the producer blocks
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Maximum size of one chunk in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Overall archive download timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestoreConfig {
    /// Parent directory of restore workspaces, system temp dir when unset
    #[serde(default)]
    pub workspace_root: Option<Utf8PathBuf>,

    /// Name prefix of restore workspaces
    #[serde(default = "default_workspace_prefix")]
    pub workspace_prefix: String,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            workspace_prefix: default_workspace_prefix(),
        }
    }
}

fn default_bin_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_BIN_ROOT)
}
fn default_channel_capacity() -> usize {
    8
}
fn default_chunk_size() -> usize {
    32 * 1024
}
fn default_fetch_timeout() -> u64 {
    600 // 10 minutes
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!(
        "pgpipe/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
fn default_workspace_prefix() -> String {
    "pgpipe-restore-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stream.channel_capacity, 8);
        assert_eq!(config.stream.chunk_size, 32 * 1024);
        assert_eq!(config.toolchain.bin_root.as_str(), DEFAULT_BIN_ROOT);
        assert!(config.restore.workspace_root.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "stream:\n  chunk-size: 4096\n";
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.stream.chunk_size, 4096);
        assert_eq!(config.stream.channel_capacity, 8);
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = RuntimeConfig::default();
        config.stream.channel_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_prefix_with_separator() {
        let mut config = RuntimeConfig::default();
        config.restore.workspace_prefix = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capability_uses_bin_root() {
        let mut config = RuntimeConfig::default();
        config.toolchain.bin_root = Utf8PathBuf::from("/opt/postgres");
        let cap = config.capability(PgVersion::V15);
        assert_eq!(cap.producer().as_str(), "/opt/postgres/15/bin/pg_dump");
    }
}
