// src/output/drain.rs

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Read size used by [`OutputDrain::spawn`].
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How the background reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    Eof,
    ReadError,
}

/// Asynchronous reader over one diagnostic stream.
///
/// A background task reads the stream and forwards each chunk over an
/// unbounded channel, so the producing process is never held up by a slow
/// (or absent) consumer. If the consumer goes away the task keeps reading
/// and discards, because a collaborator blocked on a full stderr pipe stops
/// making progress.
///
/// Every chunk returned by [`next_chunk`](Self::next_chunk) is also appended
/// to an internal transcript, so [`await_full_capture`](Self::await_full_capture)
/// returns the whole stream, including chunks already consumed for readiness.
pub struct OutputDrain {
    label: String,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    transcript: Vec<u8>,
    reader: JoinHandle<DrainEnd>,
}

impl fmt::Debug for OutputDrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDrain")
            .field("label", &self.label)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl OutputDrain {
    /// Start draining `stream` with the default chunk size.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<R>(label: impl Into<String>, stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::with_chunk_size(label, stream, DEFAULT_CHUNK_SIZE)
    }

    /// Start draining `stream`, reading at most `chunk_size` bytes per read.
    pub fn with_chunk_size<R>(label: impl Into<String>, stream: R, chunk_size: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(pump(label.clone(), stream, chunk_size.max(1), tx));

        Self {
            label,
            rx,
            transcript: Vec::new(),
            reader,
        }
    }

    /// Next chunk in write order, or `None` once the stream hit EOF or a
    /// read error and every buffered chunk has been delivered.
    ///
    /// Cancel safe: a chunk is only recorded once it has been received.
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        let chunk = self.rx.recv().await?;
        self.transcript.extend_from_slice(&chunk);
        Some(chunk)
    }

    /// Bytes delivered through [`next_chunk`](Self::next_chunk) so far.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// Block until the stream ends and return everything it produced.
    pub async fn await_full_capture(mut self) -> CapturedOutput {
        while self.next_chunk().await.is_some() {}

        let end = match (&mut self.reader).await {
            Ok(end) => end,
            Err(e) => {
                warn!(collaborator = %self.label, error = %e, "drain task did not finish cleanly");
                DrainEnd::ReadError
            }
        };

        debug!(
            collaborator = %self.label,
            bytes = self.transcript.len(),
            ?end,
            "diagnostic stream fully captured"
        );

        CapturedOutput::new(std::mem::take(&mut self.transcript), end)
    }
}

async fn pump<R>(
    label: String,
    mut stream: R,
    chunk_size: usize,
    tx: mpsc::UnboundedSender<Vec<u8>>,
) -> DrainEnd
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut tx = Some(tx);

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!(collaborator = %label, "diagnostic stream reached EOF");
                return DrainEnd::Eof;
            }
            Ok(n) => {
                trace!(collaborator = %label, bytes = n, "diagnostic chunk");
                if let Some(sender) = &tx {
                    if sender.send(buf[..n].to_vec()).is_err() {
                        debug!(
                            collaborator = %label,
                            "drain consumer dropped; discarding further output"
                        );
                        tx = None;
                    }
                }
            }
            Err(e) => {
                warn!(collaborator = %label, error = %e, "error reading diagnostic stream");
                return DrainEnd::ReadError;
            }
        }
    }
}

/// Full diagnostic output of one collaborator, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    text: String,
    end: DrainEnd,
}

impl CapturedOutput {
    pub fn new(bytes: Vec<u8>, end: DrainEnd) -> Self {
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self { text, end }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the stream ended cleanly rather than on a read error.
    pub fn reached_eof(&self) -> bool {
        self.end == DrainEnd::Eof
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
