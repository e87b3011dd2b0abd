//! CLI command implementations

pub mod dump;
pub mod ping;
pub mod restore;
pub mod versions;

use anyhow::{Context, Result};
use camino::Utf8Path;
use pgpipe_core::{ConfigLoader, RuntimeConfig};
use pgpipe_postgres::PgClient;

/// Loads the runtime configuration, from `path` when given
pub(crate) fn load_config(path: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::with_file(path),
        None => ConfigLoader::new(),
    };
    loader.load().context("Failed to load configuration")
}

pub(crate) fn client(config: Option<&Utf8Path>) -> Result<PgClient> {
    Ok(PgClient::new(load_config(config)?)?)
}
