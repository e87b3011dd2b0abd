//! Process stream adapter
//!
//! Runs the PostgreSQL client executables of a [`VersionCapability`]:
//! - `pg_dump` as a streaming producer whose stdout becomes a [`DumpStream`]
//! - `psql` as a consumer run to completion, for restores and connectivity probes

use crate::options::DumpOptions;
use crate::stream::{self, DumpStream, StreamSender};
use bytes::Bytes;
use camino::Utf8Path;
use pgpipe_core::config::StreamConfig;
use pgpipe_core::{Error, ProcessExecutionError, Result, StreamError, VersionCapability};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// How long to keep draining stderr once the producer has exited.
const STDERR_GRACE: Duration = Duration::from_secs(2);

/// Arguments for a dump: the connection target followed by the option flags.
pub fn dump_args(connection: &str, options: &DumpOptions) -> Vec<String> {
    let mut args = vec![connection.to_string()];
    args.extend(options.flags().into_iter().map(str::to_string));
    args
}

/// Arguments for a connectivity probe.
pub fn ping_args(connection: &str) -> Vec<String> {
    vec![
        connection.to_string(),
        "-c".to_string(),
        "SELECT 1;".to_string(),
    ]
}

/// Name and version of an executable, for diagnostics.
#[derive(Debug, Clone)]
struct Invocation {
    program: String,
    version: &'static str,
}

impl Invocation {
    fn new(path: &Utf8Path, version: &'static str) -> Self {
        Self {
            program: path.file_name().unwrap_or(path.as_str()).to_string(),
            version,
        }
    }

    fn failure(&self, status: ExitStatus, output: String) -> ProcessExecutionError {
        ProcessExecutionError {
            program: self.program.clone(),
            version: self.version.to_string(),
            code: status.code(),
            status: status.to_string(),
            output,
        }
    }
}

/// Starts `pg_dump` and returns its standard output as a stream.
///
/// A non-zero exit is delivered as a terminal [`StreamError::Process`] after
/// all output written before it. Dropping the returned stream kills the
/// process. Must be called from within a Tokio runtime.
pub fn dump(
    capability: &VersionCapability,
    connection: &str,
    options: &DumpOptions,
    config: &StreamConfig,
) -> DumpStream {
    let invocation = Invocation::new(capability.producer(), capability.identifier());
    debug!(
        "Starting {} v{} with flags {:?}",
        invocation.program,
        invocation.version,
        options.flags()
    );

    let mut command = Command::new(capability.producer().as_std_path());
    command
        .args(dump_args(connection, options))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let (tx, rx) = stream::channel(config.channel_capacity);
    tokio::spawn(pump(command, invocation, tx, config.chunk_size));
    rx
}

/// Owns one producer process for its whole lifetime.
async fn pump(mut command: Command, invocation: Invocation, tx: StreamSender, chunk_size: usize) {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            tx.fail(StreamError::Spawn {
                program: invocation.program,
                message: e.to_string(),
            })
            .await;
            return;
        }
    };

    let (Some(mut stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        terminate(&mut child, &invocation).await;
        tx.fail(StreamError::Read {
            program: invocation.program,
            message: "output pipes unavailable".to_string(),
        })
        .await;
        return;
    };
    let mut diagnostics = tokio::spawn(capture(stderr));

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total: u64 = 0;
    loop {
        let read = tokio::select! {
            _ = tx.closed() => {
                terminate(&mut child, &invocation).await;
                return;
            }
            read = stdout.read(&mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                total += n as u64;
                if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                    terminate(&mut child, &invocation).await;
                    return;
                }
            }
            Err(e) => {
                terminate(&mut child, &invocation).await;
                tx.fail(StreamError::Read {
                    program: invocation.program,
                    message: e.to_string(),
                })
                .await;
                return;
            }
        }
    }

    let status = tokio::select! {
        _ = tx.closed() => {
            diagnostics.abort();
            terminate(&mut child, &invocation).await;
            return;
        }
        status = child.wait() => status,
    };

    // A descendant of the producer may still hold stderr open.
    let output = tokio::select! {
        _ = tx.closed() => {
            diagnostics.abort();
            debug!("{} stream abandoned after exit", invocation.program);
            return;
        }
        captured = tokio::time::timeout(STDERR_GRACE, &mut diagnostics) => match captured {
            Ok(output) => output.unwrap_or_default(),
            Err(_) => {
                diagnostics.abort();
                warn!(
                    "{} exited but its stderr is still open; diagnostics discarded",
                    invocation.program
                );
                String::new()
            }
        },
    };

    match status {
        Ok(status) if status.success() => {
            debug!("{} finished after {} bytes", invocation.program, total);
        }
        Ok(status) => {
            warn!("{} v{} failed: {}", invocation.program, invocation.version, status);
            tx.fail(invocation.failure(status, output).into()).await;
        }
        Err(e) => {
            tx.fail(StreamError::Read {
                program: invocation.program,
                message: e.to_string(),
            })
            .await;
        }
    }
}

/// Kills an abandoned producer and reaps it.
async fn terminate(child: &mut Child, invocation: &Invocation) {
    debug!("Stopping {}: stream abandoned", invocation.program);
    if let Err(e) = child.kill().await {
        warn!("Failed to stop {}: {}", invocation.program, e);
    }
}

async fn capture(mut pipe: impl AsyncRead + Unpin) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

/// Runs `psql -f <input>` against the connection target and waits for it.
pub async fn restore_file(
    capability: &VersionCapability,
    connection: &str,
    input: &Path,
) -> Result<()> {
    let invocation = Invocation::new(capability.consumer(), capability.identifier());
    info!(
        "Restoring {} with {} v{}",
        input.display(),
        invocation.program,
        invocation.version
    );

    let mut command = Command::new(capability.consumer().as_std_path());
    command.arg(connection).arg("-f").arg(input);
    run_to_completion(command, &invocation).await
}

/// Runs `psql -c 'SELECT 1;'` against the connection target.
pub async fn ping(capability: &VersionCapability, connection: &str) -> Result<()> {
    let invocation = Invocation::new(capability.consumer(), capability.identifier());
    debug!("Pinging with {} v{}", invocation.program, invocation.version);

    let mut command = Command::new(capability.consumer().as_std_path());
    command.args(ping_args(connection));
    run_to_completion(command, &invocation).await
}

async fn run_to_completion(mut command: Command, invocation: &Invocation) -> Result<()> {
    command.stdin(Stdio::null()).kill_on_drop(true);

    let output = command
        .output()
        .await
        .map_err(|e| Error::spawn(invocation.program.clone(), e))?;

    if output.status.success() {
        return Ok(());
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(invocation.failure(output.status, combined).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_args_default() {
        assert_eq!(
            dump_args("postgres://db", &DumpOptions::default()),
            vec!["postgres://db"]
        );
    }

    #[test]
    fn test_dump_args_clean_if_exists() {
        let options = DumpOptions {
            clean: true,
            if_exists: true,
            ..Default::default()
        };
        assert_eq!(
            dump_args("postgres://db", &options),
            vec!["postgres://db", "--clean", "--if-exists"]
        );
    }

    #[test]
    fn test_ping_args() {
        assert_eq!(
            ping_args("postgres://db"),
            vec!["postgres://db", "-c", "SELECT 1;"]
        );
    }

    #[test]
    fn test_invocation_uses_file_name() {
        let invocation = Invocation::new(Utf8Path::new("/usr/lib/postgresql/16/bin/pg_dump"), "16");
        assert_eq!(invocation.program, "pg_dump");
    }
}
