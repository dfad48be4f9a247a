//! Streamed transfers with progress reporting and cooperative cancellation.
//!
//! Payloads never sit in memory as a whole: bytes move in bounded chunks,
//! the cancellation token is looked at between two chunks.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use hyper::body::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::config::default_chunk_size;
use crate::error::TransferError;

/// Where a transfer stands after a chunk.
/// `total` is `None` when the length is unknown (chunked encoding).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Progress {
    pub transferred: u64,
    pub total: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub chunk_size: usize,
    pub cancel: CancellationToken,
}
impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            cancel: CancellationToken::new(),
        }
    }
}
impl TransferOptions {
    fn chunk(&self) -> usize {
        self.chunk_size.max(1)
    }
}

/// Copy `reader` into `writer` chunk by chunk.
///
/// The writer is flushed once everything went through but never shut down,
/// it still belongs to the caller, even when the copy fails or is cancelled.
/// Returns the number of bytes copied.
pub async fn copy<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    total: Option<u64>,
    opts: &TransferOptions,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(Progress),
{
    let mut buf = vec![0u8; opts.chunk()];
    let mut transferred = 0u64;

    loop {
        if opts.cancel.is_cancelled() {
            tracing::debug!(transferred, "transfer cancelled");
            return Err(TransferError::Cancelled);
        }

        let read = fill_chunk(reader, &mut buf).await?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read]).await?;

        transferred += read as u64;
        on_progress(Progress { transferred, total });
    }

    writer.flush().await?;
    Ok(transferred)
}

/// Read until the buffer is full or the source is exhausted
async fn fill_chunk<R: AsyncRead + Unpin + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Turn a source into the chunk stream of an upload body.
///
/// When the token is cancelled, the stream yields one `Interrupted` error
/// and ends, which makes the transport abort the request.
pub struct ProgressReader<R, F> {
    inner: ReaderStream<R>,
    cancel: CancellationToken,
    on_progress: F,
    transferred: u64,
    total: Option<u64>,
    done: bool,
}
impl<R: AsyncRead, F: FnMut(Progress)> ProgressReader<R, F> {
    pub fn new(reader: R, total: Option<u64>, opts: &TransferOptions, on_progress: F) -> Self {
        Self {
            inner: ReaderStream::with_capacity(reader, opts.chunk()),
            cancel: opts.cancel.clone(),
            on_progress,
            transferred: 0,
            total,
            done: false,
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}
impl<R, F> Stream for ProgressReader<R, F>
where
    R: AsyncRead + Unpin,
    F: FnMut(Progress) + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if this.cancel.is_cancelled() {
            this.done = true;
            tracing::debug!(transferred = this.transferred, "upload cancelled");
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "upload cancelled",
            ))));
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.transferred += chunk.len() as u64;
                (this.on_progress)(Progress {
                    transferred: this.transferred,
                    total: this.total,
                });
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    const TEN_MB: usize = 10 * 1024 * 1024;

    fn source(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn progress_strictly_increases() {
        let src = source(TEN_MB);
        let mut reader = src.as_slice();
        let mut sink: Vec<u8> = Vec::new();
        let mut seen = Vec::new();

        let copied = copy(
            &mut reader,
            &mut sink,
            Some(TEN_MB as u64),
            &TransferOptions::default(),
            |p| seen.push(p),
        )
        .await
        .unwrap();

        assert_eq!(copied, TEN_MB as u64);
        assert_eq!(sink, src);
        assert_eq!(seen.len(), TEN_MB / (64 * 1024));
        assert!(seen.windows(2).all(|w| w[0].transferred < w[1].transferred));
        assert_eq!(
            seen.last(),
            Some(&Progress {
                transferred: TEN_MB as u64,
                total: Some(TEN_MB as u64)
            })
        );
    }

    #[tokio::test]
    async fn unknown_length() {
        let src = source(100_000);
        let mut reader = src.as_slice();
        let mut sink: Vec<u8> = Vec::new();
        let mut last = None;

        copy(&mut reader, &mut sink, None, &TransferOptions::default(), |p| {
            last = Some(p)
        })
        .await
        .unwrap();

        assert_eq!(
            last,
            Some(Progress {
                transferred: 100_000,
                total: None
            })
        );
    }

    #[tokio::test]
    async fn cancel_after_third_chunk() {
        let src = source(TEN_MB);
        let mut reader = src.as_slice();
        let mut sink: Vec<u8> = Vec::new();
        let opts = TransferOptions::default();
        let cancel = opts.cancel.clone();
        let mut chunks = 0;

        let res = copy(&mut reader, &mut sink, None, &opts, |_| {
            chunks += 1;
            if chunks == 3 {
                cancel.cancel();
            }
        })
        .await;

        assert!(matches!(res, Err(TransferError::Cancelled)));
        assert_eq!(chunks, 3);
        assert_eq!(sink.len(), 3 * 64 * 1024);
    }

    #[tokio::test]
    async fn upload_stream_reports_and_cancels() {
        let src = source(300 * 1024);
        let opts = TransferOptions {
            chunk_size: 100 * 1024,
            ..TransferOptions::default()
        };
        let mut seen = Vec::new();
        let stream = ProgressReader::new(src.as_slice(), Some(src.len() as u64), &opts, |p| {
            seen.push(p.transferred)
        });
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), src);
        assert_eq!(seen.last(), Some(&(300 * 1024)));

        let cancelled = TransferOptions::default();
        cancelled.cancel.cancel();
        let stream = ProgressReader::new(src.as_slice(), None, &cancelled, |_| ());
        let err = stream.try_collect::<Vec<Bytes>>().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }
}
