//! Byte stream fed by a background producer task.
//!
//! A producer task owns a [`StreamSender`] and its single reader owns the
//! matching [`DumpStream`]. The channel between them is bounded, so a producer
//! that runs ahead of its reader blocks on send. The producer closes the stream
//! either by dropping the sender (normal end) or through [`StreamSender::fail`],
//! which queues a terminal error behind every chunk already sent.
//!
//! Dropping the `DumpStream` closes the channel; producers watch for this and
//! release whatever feeds them.

use bytes::Bytes;
use futures::Stream;
use pgpipe_core::StreamError;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

type Chunk = Result<Bytes, StreamError>;

/// Creates a connected sender/stream pair holding at most `capacity` chunks.
pub(crate) fn channel(capacity: usize) -> (StreamSender, DumpStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let stream = DumpStream {
        rx,
        state: State::Open,
        pending: Bytes::new(),
    };
    (StreamSender { tx }, stream)
}

/// The reader dropped its stream.
#[derive(Debug)]
pub(crate) struct Abandoned;

/// Write side of a [`DumpStream`].
pub(crate) struct StreamSender {
    tx: mpsc::Sender<Chunk>,
}

impl StreamSender {
    /// Waits for room in the window, then queues `chunk`.
    pub(crate) async fn send(&self, chunk: Bytes) -> Result<(), Abandoned> {
        self.tx.send(Ok(chunk)).await.map_err(|_| Abandoned)
    }

    /// Blocking form of [`send`](Self::send) for producers on blocking threads.
    pub(crate) fn blocking_send(&self, chunk: Bytes) -> Result<(), Abandoned> {
        self.tx.blocking_send(Ok(chunk)).map_err(|_| Abandoned)
    }

    /// Closes the stream with a terminal error.
    pub(crate) async fn fail(self, err: StreamError) {
        // An abandoned stream has nobody left to report to.
        let _ = self.tx.send(Err(err)).await;
    }

    /// Blocking form of [`fail`](Self::fail).
    pub(crate) fn blocking_fail(self, err: StreamError) {
        let _ = self.tx.blocking_send(Err(err));
    }

    /// Resolves once the reader has dropped its stream.
    pub(crate) async fn closed(&self) {
        self.tx.closed().await
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

enum State {
    Open,
    Finished,
    Failed(StreamError),
}

/// Single-pass byte stream produced by a concurrently running process or encoder.
///
/// Chunks arrive in the order the producer wrote them. Once an error has been
/// yielded, every later poll yields the same error again; chunks delivered
/// before it stay delivered. The stream can be consumed either as a
/// [`Stream`] of [`Bytes`] or through [`AsyncRead`].
///
/// Dropping the stream before it ends tells the producer to stop.
pub struct DumpStream {
    rx: mpsc::Receiver<Chunk>,
    state: State,
    pending: Bytes,
}

impl DumpStream {
    /// Terminal error observed so far, if any
    pub fn error(&self) -> Option<&StreamError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<Chunk>> {
        match &self.state {
            State::Failed(err) => return Poll::Ready(Some(Err(err.clone()))),
            State::Finished => return Poll::Ready(None),
            State::Open => {}
        }

        match ready!(self.rx.poll_recv(cx)) {
            Some(Ok(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Some(Err(err)) => {
                self.rx.close();
                self.state = State::Failed(err.clone());
                Poll::Ready(Some(Err(err)))
            }
            None => {
                self.state = State::Finished;
                Poll::Ready(None)
            }
        }
    }
}

impl Stream for DumpStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_chunk(cx)
    }
}

impl AsyncRead for DumpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while this.pending.is_empty() {
            match ready!(this.poll_chunk(cx)) {
                Some(Ok(chunk)) => this.pending = chunk,
                Some(Err(err)) => return Poll::Ready(Err(io::Error::other(err))),
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = this.pending.len().min(buf.remaining());
        buf.put_slice(&this.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}

impl std::fmt::Debug for DumpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpStream")
            .field("pending", &self.pending.len())
            .field("error", &self.error())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::io::AsyncReadExt;

    fn read_failure() -> StreamError {
        StreamError::Read {
            program: "pg_dump".to_string(),
            message: "broken pipe".to_string(),
        }
    }

    #[tokio::test]
    async fn test_chunks_in_order_then_end() {
        let (tx, mut stream) = channel(4);
        tokio::spawn(async move {
            for part in ["a", "b", "c"] {
                tx.send(Bytes::from_static(part.as_bytes())).await.unwrap();
            }
        });

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"abc");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_is_sticky_after_data() {
        let (tx, mut stream) = channel(4);
        tx.send(Bytes::from_static(b"partial")).await.unwrap();
        tx.fail(read_failure()).await;

        assert_eq!(stream.next().await.unwrap().unwrap(), &b"partial"[..]);
        assert_eq!(stream.next().await.unwrap().unwrap_err(), read_failure());
        assert_eq!(stream.next().await.unwrap().unwrap_err(), read_failure());
        assert_eq!(stream.error(), Some(&read_failure()));
    }

    #[tokio::test]
    async fn test_async_read_surfaces_error() {
        let (tx, mut stream) = channel(4);
        tx.send(Bytes::from_static(b"12345")).await.unwrap();
        tx.fail(read_failure()).await;

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"123");
        assert_eq!(stream.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"45");

        let err = stream.read(&mut buf).await.unwrap_err();
        assert!(err.to_string().contains("broken pipe"));
        assert!(stream.read(&mut buf).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_signals_sender() {
        let (tx, stream) = channel(1);
        assert!(!tx.is_closed());
        drop(stream);
        tx.closed().await;
        assert!(tx.send(Bytes::from_static(b"late")).await.is_err());
    }

    #[tokio::test]
    async fn test_bounded_window_blocks_sender() {
        let (tx, mut stream) = channel(1);
        tx.send(Bytes::from_static(b"first")).await.unwrap();

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            tx.send(Bytes::from_static(b"second")),
        )
        .await;
        assert!(blocked.is_err(), "send should wait for the reader");

        assert_eq!(stream.next().await.unwrap().unwrap(), &b"first"[..]);
    }
}
