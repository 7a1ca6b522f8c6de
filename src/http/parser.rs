use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::timeout;

const GET_PREFIX: &str = "GET ";

/// Longest request or header line accepted before parsing gives up.
pub const MAX_LINE_LEN: usize = 8192;

/// Why the header block stopped being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEnd {
    /// The empty line terminating the headers was read.
    HeadersComplete,
    /// The peer closed the stream before the empty line.
    Closed,
    /// A read failed, timed out, or a line exceeded `MAX_LINE_LEN`.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Path from the last complete `GET ` line, empty if there was none.
    pub path: String,
    pub end: ParseEnd,
}

/// Returns the path of a `GET ` request line: everything after the prefix
/// up to the next space.
pub fn extract_get_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(GET_PREFIX)?;
    Some(rest.split(' ').next().unwrap_or(rest))
}

/// How reading a single line finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    /// A `\n` was read.
    Newline,
    /// The stream ended; the buffer holds whatever came before.
    Eof,
    /// `MAX_LINE_LEN` bytes arrived without a `\n`.
    TooLong,
    /// No bytes arrived within the idle timeout.
    Idle,
}

/// Consumes lines up to and including the empty line that ends the header
/// block. Read failures end parsing early and keep whatever path was found;
/// they are never reported as errors.
pub async fn read_request<R>(reader: &mut R, idle_timeout: Option<Duration>) -> ParsedRequest
where
    R: AsyncBufRead + Unpin,
{
    let mut path = String::new();
    let mut raw = Vec::with_capacity(256);

    let end = loop {
        raw.clear();

        let line_end = match read_line(reader, &mut raw, idle_timeout).await {
            Ok(line_end) => line_end,
            Err(e) => {
                tracing::debug!(error = %e, "Request read failed");
                break ParseEnd::Aborted;
            }
        };

        match line_end {
            LineEnd::Idle => {
                tracing::debug!(limit = ?idle_timeout, "Timed out waiting for request data");
                break ParseEnd::Aborted;
            }
            LineEnd::TooLong => {
                tracing::debug!(limit = MAX_LINE_LEN, "Request line too long");
                break ParseEnd::Aborted;
            }
            LineEnd::Eof if raw.is_empty() => break ParseEnd::Closed,
            LineEnd::Newline | LineEnd::Eof => {}
        }

        let line = String::from_utf8_lossy(trim_line_ending(&raw));
        tracing::debug!(line = %line, "Request line");

        if let Some(found) = extract_get_path(&line) {
            path = found.to_string();
        }

        if line_end == LineEnd::Eof {
            break ParseEnd::Closed;
        }

        if line.is_empty() {
            break ParseEnd::HeadersComplete;
        }
    };

    ParsedRequest { path, end }
}

/// Appends one line, including its `\n`, to `raw`. The idle timeout
/// restarts every time more bytes arrive.
async fn read_line<R>(
    reader: &mut R,
    raw: &mut Vec<u8>,
    idle_timeout: Option<Duration>,
) -> io::Result<LineEnd>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (used, found_newline) = {
            let available = match idle_timeout {
                Some(limit) => match timeout(limit, reader.fill_buf()).await {
                    Ok(result) => result?,
                    Err(_) => return Ok(LineEnd::Idle),
                },
                None => reader.fill_buf().await?,
            };

            if available.is_empty() {
                return Ok(LineEnd::Eof);
            }

            let room = MAX_LINE_LEN - raw.len();
            let window = &available[..available.len().min(room)];
            match window.iter().position(|&b| b == b'\n') {
                Some(at) => {
                    raw.extend_from_slice(&window[..=at]);
                    (at + 1, true)
                }
                None => {
                    raw.extend_from_slice(window);
                    (window.len(), false)
                }
            }
        };

        reader.consume(used);

        if found_newline {
            return Ok(LineEnd::Newline);
        }
        if raw.len() >= MAX_LINE_LEN {
            return Ok(LineEnd::TooLong);
        }
    }
}

/// Strips a trailing `\n` and then a trailing `\r`.
pub(crate) fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
