//! Supported PostgreSQL versions and the executables bound to each.
//!
//! The set is closed: only versions inside the PostgreSQL support window are
//! listed, and any other identifier is rejected rather than mapped onto a
//! "latest" toolchain. Running a dump or restore binary against a server of a
//! different major version risks format incompatibility.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default install root of the versioned PostgreSQL client binaries.
pub const DEFAULT_BIN_ROOT: &str = "/usr/lib/postgresql";

/// Supported PostgreSQL major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PgVersion {
    #[serde(rename = "13")]
    V13,
    #[serde(rename = "14")]
    V14,
    #[serde(rename = "15")]
    V15,
    #[serde(rename = "16")]
    V16,
}

impl PgVersion {
    /// Every supported version, oldest first.
    pub const ALL: [PgVersion; 4] = [
        PgVersion::V13,
        PgVersion::V14,
        PgVersion::V15,
        PgVersion::V16,
    ];

    /// Version identifier as used on the wire and in paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            PgVersion::V13 => "13",
            PgVersion::V14 => "14",
            PgVersion::V15 => "15",
            PgVersion::V16 => "16",
        }
    }

    /// Resolves the executables of this version under the default install root.
    pub fn capability(self) -> VersionCapability {
        self.capability_in(Utf8Path::new(DEFAULT_BIN_ROOT))
    }

    /// Resolves the executables of this version under `bin_root`.
    ///
    /// Layout is `<bin_root>/<version>/bin/{pg_dump,psql}`.
    pub fn capability_in(self, bin_root: &Utf8Path) -> VersionCapability {
        let bin = bin_root.join(self.as_str()).join("bin");
        VersionCapability::new(self, bin.join("pg_dump"), bin.join("psql"))
    }
}

impl fmt::Display for PgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PgVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "13" => Ok(PgVersion::V13),
            "14" => Ok(PgVersion::V14),
            "15" => Ok(PgVersion::V15),
            "16" => Ok(PgVersion::V16),
            other => Err(Error::unsupported_version(other)),
        }
    }
}

/// The producer (dump) and consumer (restore, ping) executables of one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCapability {
    version: PgVersion,
    producer: Utf8PathBuf,
    consumer: Utf8PathBuf,
}

impl VersionCapability {
    /// Binds explicit executable paths to a version.
    pub fn new(
        version: PgVersion,
        producer: impl Into<Utf8PathBuf>,
        consumer: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            version,
            producer: producer.into(),
            consumer: consumer.into(),
        }
    }

    pub fn version(&self) -> PgVersion {
        self.version
    }

    pub fn identifier(&self) -> &'static str {
        self.version.as_str()
    }

    /// Path of the dump executable
    pub fn producer(&self) -> &Utf8Path {
        &self.producer
    }

    /// Path of the restore/ping executable
    pub fn consumer(&self) -> &Utf8Path {
        &self.consumer
    }
}

/// Resolves an arbitrary identifier to the capability of a supported version.
pub fn resolve(identifier: &str) -> Result<VersionCapability> {
    identifier.parse::<PgVersion>().map(PgVersion::capability)
}
