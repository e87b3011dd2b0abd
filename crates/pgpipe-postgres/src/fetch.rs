//! Remote archive fetch & extract stage
//!
//! Downloads an archive into a [`TransientWorkspace`], then copies one named
//! entry out of it next to the download. Every step fails with its own error
//! kind so callers can tell a bad URL from a file that is not an archive from
//! an archive with the wrong contents. On failure the workspace is removed
//! before the error is returned.

use crate::workspace::TransientWorkspace;
use futures::StreamExt;
use pgpipe_core::config::RestoreConfig;
use pgpipe_core::{Error, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use zip::ZipArchive;

/// File name of the downloaded archive inside the workspace.
const ARCHIVE_FILE_NAME: &str = "dump.zip";

/// An entry extracted to disk, together with the workspace holding it.
///
/// Dropping or closing this value removes the workspace.
#[derive(Debug)]
pub struct ExtractedEntry {
    path: PathBuf,
    size_bytes: u64,
    workspace: TransientWorkspace,
}

impl ExtractedEntry {
    /// Location of the extracted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Removes the workspace and the extracted file.
    pub fn close(self) -> Result<()> {
        self.workspace.close()
    }
}

/// Downloads the archive at `url` and extracts the entry named `entry_name`.
pub async fn fetch_and_extract(
    http: &reqwest::Client,
    url: &str,
    entry_name: &str,
    config: &RestoreConfig,
) -> Result<ExtractedEntry> {
    let workspace = TransientWorkspace::create(config)?;

    let archive_path = workspace.file(ARCHIVE_FILE_NAME);
    let downloaded = download(http, url, &archive_path).await?;
    info!("Downloaded archive ({} bytes)", downloaded);

    let target = workspace.file(extracted_file_name(entry_name));
    let entry = entry_name.to_string();
    let extract_target = target.clone();
    let size_bytes =
        tokio::task::spawn_blocking(move || extract_entry(&archive_path, &entry, &extract_target))
            .await
            .map_err(|e| Error::io("archive extraction task failed", io::Error::other(e)))??;
    debug!("Extracted {} ({} bytes)", entry_name, size_bytes);

    Ok(ExtractedEntry {
        path: target,
        size_bytes,
        workspace,
    })
}

/// Streams the response body of a GET to `dest`.
async fn download(http: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    let display_url = redact(url);
    debug!("Downloading archive from {}", display_url);

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::fetch(display_url, e.without_url()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::fetch(display_url, format!("HTTP {}", status)));
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io("error creating archive file", e))?;

    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::fetch(display_url, e.without_url()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io("error writing archive file", e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::io("error writing archive file", e))?;

    Ok(written)
}

/// Copies the entry named `entry` out of the archive at `archive_path`.
///
/// The number of bytes written must match the size recorded in the archive.
fn extract_entry(archive_path: &Path, entry: &str, target: &Path) -> Result<u64> {
    let file =
        File::open(archive_path).map_err(|e| Error::io("error opening archive file", e))?;
    let mut archive = ZipArchive::new(file).map_err(Error::archive_format)?;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index).map_err(Error::archive_format)?;
        if zipped.name() != entry {
            continue;
        }

        let declared = zipped.size();
        let mut out =
            File::create(target).map_err(|e| Error::io(format!("error creating {}", entry), e))?;
        let copied = io::copy(&mut zipped, &mut out)
            .map_err(|e| Error::io(format!("error writing {}", entry), e))?;

        if copied != declared {
            return Err(Error::archive_format(format!(
                "{} is {} bytes but the archive records {}",
                entry, copied, declared
            )));
        }
        return Ok(copied);
    }

    Err(Error::entry_not_found(entry))
}

/// Local file name for an extracted entry; directory components are dropped.
fn extracted_file_name(entry: &str) -> &str {
    Path::new(entry)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| *name != ARCHIVE_FILE_NAME)
        .unwrap_or("entry.out")
}

/// URL without query string or fragment, which may carry credentials.
pub fn redact(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
