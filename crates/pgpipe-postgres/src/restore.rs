//! Restore orchestrator: fetch & extract, then feed the dump to `psql`.

use crate::archive::DUMP_ENTRY_NAME;
use crate::fetch::fetch_and_extract;
use crate::process;
use pgpipe_core::config::RestoreConfig;
use pgpipe_core::{Result, VersionCapability};
use std::time::Instant;
use tracing::{info, warn};

/// Restores the `dump.sql` entry of the archive at `url` into `connection`.
///
/// The restore workspace is removed whether or not `psql` succeeds. A missing
/// entry surfaces as [`pgpipe_core::Error::EntryNotFound`] before `psql` runs.
pub async fn restore(
    http: &reqwest::Client,
    capability: &VersionCapability,
    connection: &str,
    url: &str,
    config: &RestoreConfig,
) -> Result<()> {
    let start = Instant::now();

    let extracted = fetch_and_extract(http, url, DUMP_ENTRY_NAME, config).await?;
    let result = process::restore_file(capability, connection, extracted.path()).await;

    if let Err(e) = extracted.close() {
        warn!("Failed to remove restore workspace: {}", e);
    }

    if result.is_ok() {
        info!(
            "Restore with psql v{} complete in {:?}",
            capability.identifier(),
            start.elapsed()
        );
    }
    result
}
