use std::io::Write;

use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::error::Result;
use crate::models::StreamChunk;

/// What a consumed stream produced.
#[derive(Debug, Default)]
pub struct StreamSummary {
    pub text: String,
    pub chunks: usize,
    /// Whether the server sent its `done` marker before the body ended.
    pub terminated: bool,
    pub model: Option<String>,
    pub eval_count: Option<u64>,
    pub prompt_eval_count: Option<u64>,
}

/// Write every fragment of `stream` to `out` as soon as it is decoded.
///
/// Fragments are written back to back with no separator and `out` is flushed
/// after each one. The first error stops consumption and is returned; what was
/// already written stays written.
pub async fn print_stream<S, W>(stream: S, out: &mut W) -> Result<StreamSummary>
where
    S: Stream<Item = Result<StreamChunk>>,
    W: Write,
{
    let mut summary = StreamSummary::default();

    tokio::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        summary.chunks += 1;
        if summary.model.is_none() {
            summary.model = chunk.model.clone();
        }

        let fragment = chunk.fragment();
        if !fragment.is_empty() {
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
            summary.text.push_str(fragment);
        }

        if chunk.done {
            summary.terminated = true;
            summary.eval_count = chunk.eval_count;
            summary.prompt_eval_count = chunk.prompt_eval_count;
        }
    }

    debug!(
        chunks = summary.chunks,
        terminated = summary.terminated,
        "stream consumed"
    );
    Ok(summary)
}
