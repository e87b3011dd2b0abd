//! Archive packaging stage
//!
//! Re-packages a dump stream as a single-entry ZIP archive while it is being
//! produced. The encoder runs on a blocking thread and writes through the same
//! bounded channel as the process adapter, so neither the dump nor the archive
//! is ever held in memory as a whole.

use crate::stream::{self, DumpStream, StreamSender};
use bytes::Bytes;
use futures::StreamExt;
use pgpipe_core::config::StreamConfig;
use pgpipe_core::StreamError;
use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use tokio::runtime::Handle;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the archive entry holding the SQL dump.
pub const DUMP_ENTRY_NAME: &str = "dump.sql";

/// Wraps `source` into a streaming ZIP archive with one entry named `entry_name`.
///
/// Read errors from `source` and encoder failures end the returned stream with
/// that error. Dropping the returned stream drops `source` as well.
/// Must be called from within a Tokio runtime.
pub fn package_as_archive(source: DumpStream, entry_name: &str, config: &StreamConfig) -> DumpStream {
    let (tx, rx) = stream::channel(config.channel_capacity);
    let entry = entry_name.to_string();
    let runtime = Handle::current();

    tokio::task::spawn_blocking(move || match encode(&runtime, source, &entry, &tx) {
        Ok(written) => debug!("Archived {} ({} bytes compressed)", entry, written),
        Err(_) if tx.is_closed() => debug!("Archive stream for {} abandoned", entry),
        Err(err) => tx.blocking_fail(err),
    });

    rx
}

fn encode(
    runtime: &Handle,
    mut source: DumpStream,
    entry: &str,
    tx: &StreamSender,
) -> Result<u64, StreamError> {
    let sealed = Rc::new(Cell::new(false));
    let written = Rc::new(Cell::new(0));
    let sink = ChannelWriter {
        tx,
        sealed: Rc::clone(&sealed),
        written: Rc::clone(&written),
    };

    let mut zip = ZipWriter::new_stream(sink);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    let copied = match zip.start_file(entry, options) {
        Ok(()) => copy_chunks(runtime, tx, &mut source, &mut zip, entry),
        Err(e) => Err(StreamError::encode(entry, e)),
    };

    if let Err(err) = copied {
        // Nothing more may reach the reader ahead of the error, including
        // whatever the writer emits while being dropped.
        sealed.set(true);
        drop(zip);
        return Err(err);
    }

    zip.finish().map_err(|e| StreamError::encode(entry, e))?;
    Ok(written.get())
}

/// Feeds `source` into `sink` until it ends, fails, or the reader of `tx` goes away.
fn copy_chunks(
    runtime: &Handle,
    tx: &StreamSender,
    source: &mut DumpStream,
    sink: &mut impl Write,
    entry: &str,
) -> Result<(), StreamError> {
    loop {
        let next = runtime.block_on(async {
            tokio::select! {
                _ = tx.closed() => None,
                chunk = source.next() => Some(chunk),
            }
        });

        match next {
            None => return Err(StreamError::encode(entry, "archive reader dropped")),
            Some(None) => return Ok(()),
            Some(Some(chunk)) => sink
                .write_all(&chunk?)
                .map_err(|e| StreamError::encode(entry, e))?,
        }
    }
}

/// `Write` adapter forwarding encoder output into a stream channel.
struct ChannelWriter<'a> {
    tx: &'a StreamSender,
    sealed: Rc<Cell<bool>>,
    written: Rc<Cell<u64>>,
}

impl Write for ChannelWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.sealed.get() || buf.is_empty() {
            return Ok(buf.len());
        }
        self.tx
            .blocking_send(Bytes::copy_from_slice(buf))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive reader dropped"))?;
        self.written.set(self.written.get() + buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
