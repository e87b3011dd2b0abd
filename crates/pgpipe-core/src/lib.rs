//! # pgpipe-core
//!
//! Core library for pgpipe providing:
//! - The closed set of supported PostgreSQL versions and their executables
//! - The error taxonomy shared by the dump/restore pipeline
//! - Runtime configuration with file and environment overrides

pub mod config;
pub mod error;
pub mod version;

pub use config::{ConfigLoader, RuntimeConfig};
pub use error::{Error, ProcessExecutionError, Result, StreamError};
pub use version::{resolve, PgVersion, VersionCapability, DEFAULT_BIN_ROOT};
