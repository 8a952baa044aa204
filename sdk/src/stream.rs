//! Stream plumbing: exact reads and writes that give up as soon as the
//! cancellation token fires, and a byte-counting adapter.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio_util::sync::CancellationToken;

use crate::error::FieldError;

/// Largest buffer reserved up front. Longer fields grow as bytes arrive, so a
/// huge declared width on a short stream fails with `StreamClosed` instead of
/// allocating the whole width first.
const INITIAL_CAPACITY: usize = 64 * 1024;

/// Reads exactly `len` bytes for `field`.
pub(crate) async fn read_exact<R>(
    stream: &mut R,
    len: usize,
    field: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, FieldError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(FieldError::Cancelled);
    }
    let mut buf = Vec::with_capacity(len.min(INITIAL_CAPACITY));
    let mut limited = (&mut *stream).take(len as u64);
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        res = limited.read_to_end(&mut buf) => Some(res),
    };
    match outcome {
        None => Err(FieldError::Cancelled),
        Some(Ok(n)) if n == len => Ok(buf),
        Some(Ok(_)) => Err(FieldError::StreamClosed {
            field:  field.to_string(),
            needed: len,
        }),
        Some(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FieldError::StreamClosed {
            field:  field.to_string(),
            needed: len,
        }),
        Some(Err(e)) => Err(FieldError::Read {
            field:  field.to_string(),
            source: e,
        }),
    }
}

/// Writes all of `bytes` for `field`.
pub(crate) async fn write_all<W>(
    stream: &mut W,
    bytes: &[u8],
    field: &str,
    cancel: &CancellationToken,
) -> Result<(), FieldError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(FieldError::Cancelled);
    }
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        res = stream.write_all(bytes) => Some(res),
    };
    match outcome {
        None => Err(FieldError::Cancelled),
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(FieldError::Write {
            field:  field.to_string(),
            source: e,
        }),
    }
}

pub(crate) async fn flush<W>(stream: &mut W, cancel: &CancellationToken) -> Result<(), FieldError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        res = stream.flush() => Some(res),
    };
    match outcome {
        None => Err(FieldError::Cancelled),
        Some(res) => res.map_err(FieldError::Flush),
    }
}

/// Wraps a stream and counts the bytes that pass through it.
///
/// `position()` is the starting offset plus every byte read and written,
/// which matches a single-cursor stream such as a file or an in-memory
/// buffer. Use it as the base offset of a verify pass.
#[derive(Debug)]
pub struct TrackedStream<S> {
    inner: S,
    start: u64,
    bytes_read: u64,
    bytes_written: u64,
}

impl<S> TrackedStream<S> {
    pub fn new(inner: S) -> TrackedStream<S> {
        TrackedStream::with_position(inner, 0)
    }

    /// Starts counting from `start`, for streams that are not at offset 0.
    pub fn with_position(inner: S, start: u64) -> TrackedStream<S> {
        TrackedStream {
            inner,
            start,
            bytes_read: 0,
            bytes_written: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.start + self.bytes_read + self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            self.bytes_read += (buf.filled().len() - before) as u64;
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, data);
        if let Poll::Ready(Ok(n)) = poll {
            self.bytes_written += n as u64;
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_exact_reports_closed_stream() {
        let cancel = CancellationToken::new();
        let mut stream: &[u8] = &[1, 2, 3];
        assert_eq!(read_exact(&mut stream, 2, "a", &cancel).await.unwrap(), [1, 2]);
        let err = read_exact(&mut stream, 2, "b", &cancel).await.unwrap_err();
        assert!(matches!(err, FieldError::StreamClosed { needed: 2, .. }));
    }

    #[tokio::test]
    async fn huge_width_on_a_short_stream_is_closed_not_allocated() {
        let cancel = CancellationToken::new();
        let mut stream: &[u8] = &[1, 2, 3];
        let err = read_exact(&mut stream, usize::MAX, "a", &cancel).await.unwrap_err();
        assert!(matches!(err, FieldError::StreamClosed { needed: usize::MAX, .. }));
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_io() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream: &[u8] = &[1, 2, 3];
        let err = read_exact(&mut stream, 1, "a", &cancel).await.unwrap_err();
        assert!(matches!(err, FieldError::Cancelled));
        assert_eq!(stream.len(), 3);

        let mut out = Vec::new();
        let err = write_all(&mut out, &[1], "a", &cancel).await.unwrap_err();
        assert!(matches!(err, FieldError::Cancelled));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_read() {
        let cancel = CancellationToken::new();
        let (mut client, _server) = tokio::io::duplex(64);
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });
        let err = read_exact(&mut client, 4, "a", &cancel).await.unwrap_err();
        assert!(matches!(err, FieldError::Cancelled));
    }

    #[tokio::test]
    async fn tracked_stream_counts_both_directions() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut tracked = TrackedStream::with_position(client, 10);
        tracked.write_all(&[1, 2, 3]).await.unwrap();
        server.write_all(&[9, 9]).await.unwrap();
        let mut buf = [0u8; 2];
        tracked.read_exact(&mut buf).await.unwrap();
        assert_eq!(tracked.bytes_written(), 3);
        assert_eq!(tracked.bytes_read(), 2);
        assert_eq!(tracked.position(), 15);
    }
}
