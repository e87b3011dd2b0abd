//! PostgreSQL client façade over the dump/restore pipeline.

use crate::archive::{package_as_archive, DUMP_ENTRY_NAME};
use crate::options::DumpOptions;
use crate::stream::DumpStream;
use crate::{process, restore};
use pgpipe_core::{Error, PgVersion, Result, RuntimeConfig, VersionCapability};
use std::time::Duration;

/// Runs dumps, restores and pings for the supported PostgreSQL versions.
#[derive(Debug, Clone)]
pub struct PgClient {
    config: RuntimeConfig,
    http: reqwest::Client,
}

impl PgClient {
    /// Creates a client with its own HTTP client for archive downloads.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.network.user_agent)
            .connect_timeout(Duration::from_secs(config.network.connect_timeout_secs))
            .timeout(Duration::from_secs(config.network.fetch_timeout_secs))
            .build()
            .map_err(|e| Error::invalid_config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Parses a version identifier, rejecting anything outside the supported set.
    pub fn parse_version(&self, identifier: &str) -> Result<PgVersion> {
        identifier.parse()
    }

    /// Executables of `version` under the configured install root.
    pub fn capability(&self, version: PgVersion) -> VersionCapability {
        self.config.capability(version)
    }

    /// Checks that `connection` accepts a trivial query.
    pub async fn ping(&self, version: PgVersion, connection: &str) -> Result<()> {
        process::ping(&self.capability(version), connection).await
    }

    /// Streams a plain SQL dump. `None` dumps with every option off.
    pub fn dump(
        &self,
        version: PgVersion,
        connection: &str,
        options: Option<&DumpOptions>,
    ) -> DumpStream {
        process::dump(
            &self.capability(version),
            connection,
            options.unwrap_or(&DumpOptions::default()),
            &self.config.stream,
        )
    }

    /// Streams the dump packaged as a ZIP archive holding a single `dump.sql`.
    pub fn dump_zip(
        &self,
        version: PgVersion,
        connection: &str,
        options: Option<&DumpOptions>,
    ) -> DumpStream {
        let dump = self.dump(version, connection, options);
        package_as_archive(dump, DUMP_ENTRY_NAME, &self.config.stream)
    }

    /// Downloads the archive at `url` and restores its `dump.sql` with `psql`.
    pub async fn restore_zip(&self, version: PgVersion, connection: &str, url: &str) -> Result<()> {
        restore::restore(
            &self.http,
            &self.capability(version),
            connection,
            url,
            &self.config.restore,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let client = PgClient::new(RuntimeConfig::default()).unwrap();
        assert_eq!(client.parse_version("14").unwrap(), PgVersion::V14);
        assert!(matches!(
            client.parse_version("9.6"),
            Err(Error::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_capability_follows_config() {
        let mut config = RuntimeConfig::default();
        config.toolchain.bin_root = "/opt/pg".into();
        let client = PgClient::new(config).unwrap();

        let cap = client.capability(PgVersion::V16);
        assert_eq!(cap.producer().as_str(), "/opt/pg/16/bin/pg_dump");
        assert_eq!(cap.consumer().as_str(), "/opt/pg/16/bin/psql");
    }
}
