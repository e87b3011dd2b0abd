//! pgpipe PostgreSQL pipeline
//!
//! Streams `pg_dump` output to callers without buffering whole dumps, and
//! restores dumps from remote archives through `psql`.
//!
//! # Features
//!
//! - **Streaming dumps**: `pg_dump` stdout is exposed as a [`DumpStream`] fed
//!   through a bounded window; a failing dump ends the stream with an error
//!   instead of silently truncating it
//! - **ZIP packaging**: the dump can be wrapped on the fly into an archive
//!   holding a single `dump.sql`
//! - **Remote restore**: archives are downloaded and extracted into a
//!   call-scoped workspace that is always removed afterwards
//!
//! # Examples
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use pgpipe_postgres::{DumpOptions, PgClient};
//! use pgpipe_core::{ConfigLoader, PgVersion};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PgClient::new(ConfigLoader::new().load()?)?;
//!     let options = DumpOptions {
//!         clean: true,
//!         if_exists: true,
//!         ..Default::default()
//!     };
//!
//!     let mut archive = client.dump_zip(PgVersion::V16, "postgres://localhost/app", Some(&options));
//!     while let Some(chunk) = archive.try_next().await? {
//!         println!("{} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod client;
pub mod fetch;
pub mod options;
pub mod process;
pub mod restore;
pub mod stream;
pub mod workspace;

pub use archive::{package_as_archive, DUMP_ENTRY_NAME};
pub use client::PgClient;
pub use fetch::{fetch_and_extract, ExtractedEntry};
pub use options::DumpOptions;
pub use stream::DumpStream;
pub use workspace::TransientWorkspace;
