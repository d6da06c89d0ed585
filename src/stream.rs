//! Newline-delimited JSON decoding of a streamed response body.
//!
//! The server emits one JSON object per line:
//! ```text
//! {"model":"llama3","response":"Hel","done":false}
//! {"model":"llama3","response":"lo","done":false}
//! {"model":"llama3","response":"","done":true,"done_reason":"stop"}
//! ```
//!
//! [`json_lines`] turns the raw byte stream into a lazy stream of
//! [`StreamChunk`]s. Nothing is read from the connection until the consumer
//! asks for the next chunk.

use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::trace;

use crate::error::{Error, Result};
use crate::models::StreamChunk;

/// Decode `body` into chunks, waiting at most `idle` for each piece of the body.
///
/// The stream ends after a chunk with `done = true`, when the body ends, or
/// right after the first error it yields.
pub fn json_lines<S, B, E>(body: S, idle: Duration) -> impl Stream<Item = Result<StreamChunk>>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    let reader = LineReader {
        body,
        buf: Vec::new(),
        idle,
        eof: false,
        finished: false,
    };

    stream::unfold(reader, |mut reader| async move {
        match reader.next_chunk().await {
            Ok(Some(chunk)) => Some((Ok(chunk), reader)),
            Ok(None) => None,
            Err(e) => {
                reader.finished = true;
                Some((Err(e), reader))
            }
        }
    })
}

struct LineReader<S> {
    body: S,
    buf: Vec<u8>,
    idle: Duration,
    eof: bool,
    finished: bool,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    async fn next_chunk(&mut self) -> Result<Option<StreamChunk>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if let Some(line) = self.take_line() {
                if let Some(chunk) = self.decode(&line)? {
                    return Ok(Some(chunk));
                }
                continue;
            }

            if self.eof {
                self.finished = true;
                // Last line may lack its newline.
                let rest = std::mem::take(&mut self.buf);
                return self.decode(&rest);
            }

            match tokio::time::timeout(self.idle, self.body.next()).await {
                Err(_) => return Err(Error::Timeout(self.idle)),
                Ok(Some(Ok(bytes))) => self.buf.extend_from_slice(bytes.as_ref()),
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => self.eof = true,
            }
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        Some(line)
    }

    /// `Ok(None)` for blank lines.
    fn decode(&mut self, line: &[u8]) -> Result<Option<StreamChunk>> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let chunk = StreamChunk::from_line(line)?;
        if let Some(message) = &chunk.error {
            return Err(Error::Server(message.clone()));
        }
        if chunk.done {
            trace!(done_reason = ?chunk.done_reason, "terminal chunk");
            self.finished = true;
        }
        Ok(Some(chunk))
    }
}
