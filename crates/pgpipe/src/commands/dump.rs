//! Dump command
//!
//! Streams pg_dump output, optionally packaged as a ZIP archive, to a file or
//! stdout. A failed dump never leaves a truncated file behind.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use futures::StreamExt;
use indicatif::ProgressBar;
use pgpipe_core::Error;
use pgpipe_postgres::{DumpOptions, DumpStream};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::cli::TargetArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Dump only the data, not the schema
    #[arg(long)]
    pub data_only: bool,

    /// Dump only the schema, no data
    #[arg(long)]
    pub schema_only: bool,

    /// Emit DROP commands before CREATE
    #[arg(long)]
    pub clean: bool,

    /// Use IF EXISTS when dropping objects
    #[arg(long)]
    pub if_exists: bool,

    /// Include a CREATE DATABASE command
    #[arg(long)]
    pub create: bool,

    /// Do not dump comments
    #[arg(long)]
    pub no_comments: bool,

    /// Package the dump as a ZIP archive holding dump.sql
    #[arg(long)]
    pub zip: bool,

    /// Output file ("-" or absent for stdout)
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

impl DumpArgs {
    fn options(&self) -> DumpOptions {
        DumpOptions {
            data_only: self.data_only,
            schema_only: self.schema_only,
            clean: self.clean,
            if_exists: self.if_exists,
            create: self.create,
            no_comments: self.no_comments,
        }
    }

    /// Output file, or `None` for stdout
    fn output_path(&self) -> Option<&Utf8Path> {
        self.output.as_deref().filter(|path| path.as_str() != "-")
    }
}

pub async fn run(args: DumpArgs, config: Option<&Utf8Path>) -> Result<()> {
    let client = super::client(config)?;
    let version = client.parse_version(&args.target.pg_version)?;
    let options = args.options();

    let stream = if args.zip {
        client.dump_zip(version, &args.target.connection, Some(&options))
    } else {
        client.dump(version, &args.target.connection, Some(&options))
    };

    let spinner = output::spinner(&format!("Dumping with pg_dump v{}", version));

    let Some(path) = args.output_path() else {
        let mut stdout = tokio::io::stdout();
        let result = copy_stream(stream, &mut stdout, &spinner).await;
        spinner.finish_and_clear();
        let written = result?;
        output::success(&format!("Dump complete ({})", output::format_bytes(written)));
        return Ok(());
    };

    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path))?;
    let result = copy_stream(stream, &mut file, &spinner).await;
    spinner.finish_and_clear();
    drop(file);

    match result {
        Ok(written) => {
            output::success(&format!(
                "Dump written to {} ({})",
                path,
                output::format_bytes(written)
            ));
            Ok(())
        }
        Err(e) => {
            match tokio::fs::remove_file(path).await {
                Ok(()) => output::error(&format!("Dump failed, removed partial {}", path)),
                Err(rm) => output::warning(&format!("Could not remove partial {}: {}", path, rm)),
            }
            Err(e)
        }
    }
}

/// Writes every chunk of `stream` to `sink`, returning the byte count.
///
/// A terminal stream error aborts the copy with that error.
async fn copy_stream<W>(mut stream: DumpStream, sink: &mut W, progress: &ProgressBar) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Error::from).context("Dump failed")?;
        sink.write_all(&chunk)
            .await
            .context("Failed to write dump output")?;
        written += chunk.len() as u64;
        progress.set_message(format!("Dumped {}", output::format_bytes(written)));
    }
    sink.flush().await.context("Failed to write dump output")?;
    Ok(written)
}
