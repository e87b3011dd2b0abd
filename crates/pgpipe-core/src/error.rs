//! Error types for pgpipe-core

use thiserror::Error;

/// Result type alias using pgpipe-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A producer or consumer executable exited with a non-zero status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error running {program} v{version} ({status}): {output}")]
pub struct ProcessExecutionError {
    /// Executable name, e.g. `pg_dump`
    pub program: String,

    /// Version identifier the executable belongs to
    pub version: String,

    /// Exit code, absent when the process was terminated by a signal
    pub code: Option<i32>,

    /// Printable exit status
    pub status: String,

    /// Captured diagnostic output
    pub output: String,
}

/// Terminal error delivered through a dump stream.
///
/// Cloneable so a stream can hand the same error to every read after
/// the first failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The producer exited non-zero
    #[error(transparent)]
    Process(#[from] ProcessExecutionError),

    /// The producer could not be started
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// Reading the producer's output failed
    #[error("error reading {program} output: {message}")]
    Read { program: String, message: String },

    /// The archive encoder failed
    #[error("error writing {entry} to archive: {message}")]
    Encode { entry: String, message: String },
}

impl StreamError {
    /// Create an encoder error for the given archive entry
    pub fn encode(entry: impl Into<String>, message: impl ToString) -> Self {
        Self::Encode {
            entry: entry.into(),
            message: message.to_string(),
        }
    }
}

/// Core error types for pgpipe
#[derive(Error, Debug)]
pub enum Error {
    /// Version identifier outside the supported set
    #[error("pg version not allowed: {version}")]
    UnsupportedVersion { version: String },

    /// Producer or consumer exited non-zero
    #[error(transparent)]
    ProcessExecution(#[from] ProcessExecutionError),

    /// Executable could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Failure delivered through a dump stream
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Network or HTTP failure while downloading an archive
    #[error("error downloading archive from {url}: {message}")]
    Fetch { url: String, message: String },

    /// Local filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded file is not a readable archive
    #[error("invalid archive: {message}")]
    ArchiveFormat { message: String },

    /// The archive does not contain the requested entry
    #[error("{entry} not found in archive")]
    EntryNotFound { entry: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Create an unsupported version error
    pub fn unsupported_version(version: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            version: version.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an archive format error
    pub fn archive_format(message: impl ToString) -> Self {
        Self::ArchiveFormat {
            message: message.to_string(),
        }
    }

    /// Create an entry not found error
    pub fn entry_not_found(entry: impl Into<String>) -> Self {
        Self::EntryNotFound {
            entry: entry.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_dump() -> ProcessExecutionError {
        ProcessExecutionError {
            program: "pg_dump".to_string(),
            version: "16".to_string(),
            code: Some(1),
            status: "exit status: 1".to_string(),
            output: "connection refused".to_string(),
        }
    }

    #[test]
    fn test_process_error_message() {
        let err = failed_dump();
        assert_eq!(
            err.to_string(),
            "error running pg_dump v16 (exit status: 1): connection refused"
        );
    }

    #[test]
    fn test_stream_error_wraps_process_error() {
        let err: StreamError = failed_dump().into();
        assert!(matches!(err, StreamError::Process(ref e) if e.code == Some(1)));
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn test_stream_error_converts_transparently() {
        let err = Error::from(StreamError::from(failed_dump()));
        assert!(matches!(err, Error::Stream(StreamError::Process(_))));
        assert_eq!(
            err.to_string(),
            "error running pg_dump v16 (exit status: 1): connection refused"
        );
    }

    #[test]
    fn test_restore_errors_are_distinct() {
        let fetch = Error::fetch("http://host/x.zip", "HTTP 404");
        let format = Error::archive_format("invalid Zip archive");
        let missing = Error::entry_not_found("dump.sql");

        assert!(matches!(fetch, Error::Fetch { .. }));
        assert!(matches!(format, Error::ArchiveFormat { .. }));
        assert_eq!(missing.to_string(), "dump.sql not found in archive");
    }
}
