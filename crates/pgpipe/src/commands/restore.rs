//! Restore command
//!
//! Downloads a ZIP archive holding `dump.sql` and feeds it to psql.

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Args;
use pgpipe_postgres::fetch::redact;
use std::time::Instant;

use crate::cli::TargetArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// URL of the ZIP archive to restore
    pub url: String,
}

pub async fn run(args: RestoreArgs, config: Option<&Utf8Path>) -> Result<()> {
    output::header("Restore Database");

    let client = super::client(config)?;
    let version = client.parse_version(&args.target.pg_version)?;

    output::kv("Source", redact(&args.url));
    output::kv("psql", client.capability(version).consumer().as_str());

    let start = Instant::now();
    let spinner = output::spinner("Downloading and restoring archive...");
    let result = client
        .restore_zip(version, &args.target.connection, &args.url)
        .await;
    spinner.finish_and_clear();

    result.context("Restore failed")?;
    output::success(&format!(
        "Restore completed in {:.1}s",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}
