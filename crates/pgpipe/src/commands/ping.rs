//! Ping command

use crate::cli::PingArgs;
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;

pub async fn run(args: PingArgs, config: Option<&Utf8Path>) -> Result<()> {
    let client = super::client(config)?;
    let version = client.parse_version(&args.target.pg_version)?;

    let spinner = output::spinner(&format!("Pinging database with psql v{}", version));
    let result = client.ping(version, &args.target.connection).await;
    spinner.finish_and_clear();

    result.context("Ping failed")?;
    output::success("Database is reachable");
    Ok(())
}
