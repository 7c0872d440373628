//! Node runtime.
//!
//! Reads newline-delimited messages from an async reader, runs each line
//! through the [`Dispatcher`], and writes the resulting frames to an async
//! writer. Lines are handled strictly one at a time: every frame produced by
//! a line is written and flushed before the next line is read.
//!
//! The loop is generic over the streams so tests can drive a node from
//! in-memory buffers; [`run_stdio`] binds it to the process's standard
//! streams.
//!
//! Lines longer than [`DispatchOptions::max_line_size`] are skipped up to
//! their terminator without being buffered.

mod dispatcher;

pub use dispatcher::{DispatchOptions, DispatchStats, Dispatcher, DEFAULT_MAX_LINE_SIZE};

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace};

use crate::error::RuntimeError;

/// Initial capacity of the line buffer
const LINE_CAPACITY: usize = 4096;

/// Outcome of reading one line.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    /// A complete line, terminator included when present, is in the buffer.
    Line,
    /// The line exceeded the limit and was discarded; holds its full length.
    Oversized(usize),
}

/// Read up to and including the next `\n`, keeping at most `limit` bytes.
///
/// Once a line grows past `limit` the buffer is cleared and the rest of the
/// line is consumed from `input` without being copied.
async fn read_line_capped<R>(
    input: &mut R,
    line: &mut Vec<u8>,
    limit: usize,
) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut total = 0usize;

    loop {
        let available = input.fill_buf().await?;
        if available.is_empty() {
            return Ok(match total {
                0 => LineRead::Eof,
                n if n > limit => LineRead::Oversized(n),
                _ => LineRead::Line,
            });
        }

        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };
        total += used;
        if total <= limit {
            line.extend_from_slice(&available[..used]);
        } else {
            line.clear();
        }
        input.consume(used);

        if done {
            return Ok(if total > limit {
                LineRead::Oversized(total)
            } else {
                LineRead::Line
            });
        }
    }
}

/// Run the dispatch loop until `input` reaches end of stream.
pub async fn run<R, W>(dispatcher: &mut Dispatcher, mut input: R, mut output: W) -> Result<(), RuntimeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limit = dispatcher.options().max_line_size;
    let mut line = Vec::with_capacity(LINE_CAPACITY);

    loop {
        line.clear();
        // Give back memory held since a long line
        line.shrink_to(LINE_CAPACITY);

        let frames = match read_line_capped(&mut input, &mut line, limit)
            .await
            .map_err(RuntimeError::Input)?
        {
            LineRead::Eof => {
                debug!("Input closed");
                break;
            }
            LineRead::Line => dispatcher.process_line(&line),
            LineRead::Oversized(len) => {
                dispatcher.oversized_line(len);
                continue;
            }
        };
        if frames.is_empty() {
            continue;
        }

        for frame in &frames {
            trace!(bytes = frame.len(), "Writing frame");
            output.write_all(frame).await.map_err(RuntimeError::Output)?;
        }
        output.flush().await.map_err(RuntimeError::Output)?;
    }

    Ok(())
}

/// Run the dispatch loop on stdin/stdout.
pub async fn run_stdio(dispatcher: &mut Dispatcher) -> Result<(), RuntimeError> {
    let input = BufReader::new(tokio::io::stdin());
    run(dispatcher, input, tokio::io::stdout()).await
}
