use std::borrow::Cow;
use std::io;
use std::path::Path;

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::StaticFilesConfig;
use crate::http::mime::ContentType;
use crate::http::parser::trim_line_ending;
use crate::http::request::RequestContext;
use crate::http::response::{self, StatusCode};

pub const DATE_TAG: &[u8] = b"<cs371date>";
pub const SERVER_TAG: &[u8] = b"<cs371server>";

/// Written into the body, ahead of the 404 document, whenever the fallback
/// page is served.
pub const NOT_FOUND_BANNER: &[u8] = b"HTTP/1.1 404: Not Found";

/// How the body stage finished. Only unexpected faults become errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOutcome {
    /// The requested file was sent.
    Served,
    /// The 404 document was sent in place of the requested file.
    FellBack,
    /// The image could not be opened; nothing followed the header.
    Abandoned,
}

/// Writes the response body for an already-sent header.
pub async fn write_body<W>(
    out: &mut W,
    ctx: &RequestContext,
    cfg: &StaticFilesConfig,
) -> anyhow::Result<BodyOutcome>
where
    W: AsyncWrite + Unpin,
{
    match (ctx.status, ctx.content_type) {
        (StatusCode::Ok, ContentType::Html) => write_text(out, &ctx.file_path, cfg).await,
        (StatusCode::Ok, content_type) if content_type.is_image() => {
            write_binary(out, &ctx.file_path).await
        }
        _ => {
            write_not_found(out, &cfg.not_found_document).await?;
            Ok(BodyOutcome::FellBack)
        }
    }
}

async fn write_text<W>(
    out: &mut W,
    file_path: &Path,
    cfg: &StaticFilesConfig,
) -> anyhow::Result<BodyOutcome>
where
    W: AsyncWrite + Unpin,
{
    let file = match open_regular(file_path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(
                path = %file_path.display(),
                error = %e,
                "File vanished before it could be served"
            );
            write_not_found(out, &cfg.not_found_document).await?;
            return Ok(BodyOutcome::FellBack);
        }
    };

    let server_version = cfg.server_version.as_bytes();
    copy_lines(file, out, Some(server_version))
        .await
        .with_context(|| format!("streaming {}", file_path.display()))?;

    Ok(BodyOutcome::Served)
}

async fn write_binary<W>(out: &mut W, file_path: &Path) -> anyhow::Result<BodyOutcome>
where
    W: AsyncWrite + Unpin,
{
    let bytes = match read_regular(file_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %file_path.display(), error = %e, "Image not found");
            return Ok(BodyOutcome::Abandoned);
        }
    };

    out.write_all(&bytes).await.context("writing image body")?;

    Ok(BodyOutcome::Served)
}

/// Writes the banner and then the 404 document verbatim. A missing 404
/// document is fatal to the connection.
pub async fn write_not_found<W>(out: &mut W, document: &Path) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(NOT_FOUND_BANNER).await.context("writing 404 banner")?;

    let file = File::open(document)
        .await
        .with_context(|| format!("opening 404 document {}", document.display()))?;

    copy_lines(file, out, None)
        .await
        .with_context(|| format!("streaming 404 document {}", document.display()))?;

    tracing::debug!(document = %document.display(), "Served 404 document");
    Ok(())
}

/// Copies `file` line by line, terminating each line with `\n`. A line ends
/// at `\n`, `\r\n` or a lone `\r`. Tags are substituted only when
/// `server_version` is given.
async fn copy_lines<W>(file: File, out: &mut W, server_version: Option<&[u8]>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(file);
    let mut raw = Vec::with_capacity(1024);

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(());
        }

        for line in trim_line_ending(&raw).split(|&b| b == b'\r') {
            let line = match server_version {
                Some(server_version) => substitute_tags(line, server_version),
                None => Cow::Borrowed(line),
            };
            out.write_all(&line).await?;
            out.write_all(b"\n").await?;
        }
    }
}

/// Rewrites `<cs371date>` with the current timestamp and `<cs371server>`
/// with `server_version`. Lines without either tag are returned untouched.
pub fn substitute_tags<'a>(line: &'a [u8], server_version: &[u8]) -> Cow<'a, [u8]> {
    match replace_all(line, DATE_TAG, || response::timestamp().into_bytes()) {
        Cow::Borrowed(line) => replace_all(line, SERVER_TAG, || server_version.to_vec()),
        Cow::Owned(dated) => Cow::Owned(
            replace_all(&dated, SERVER_TAG, || server_version.to_vec()).into_owned(),
        ),
    }
}

/// Replaces every occurrence of `needle`. `replacement` is only evaluated
/// when there is at least one match.
pub fn replace_all<'a, F>(haystack: &'a [u8], needle: &[u8], replacement: F) -> Cow<'a, [u8]>
where
    F: FnOnce() -> Vec<u8>,
{
    let Some(first) = find(haystack, needle) else {
        return Cow::Borrowed(haystack);
    };

    let replacement = replacement();
    let mut replaced = Vec::with_capacity(haystack.len() + replacement.len());
    let mut rest = haystack;
    let mut next = Some(first);

    while let Some(at) = next {
        replaced.extend_from_slice(&rest[..at]);
        replaced.extend_from_slice(&replacement);
        rest = &rest[at + needle.len()..];
        next = find(rest, needle);
    }
    replaced.extend_from_slice(rest);

    Cow::Owned(replaced)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Opens `path` only if it is a regular file; directories count as missing.
async fn open_regular(path: &Path) -> io::Result<File> {
    let file = File::open(path).await?;
    if !file.metadata().await?.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }
    Ok(file)
}

/// Reads the whole file in one pass sized to its current length.
async fn read_regular(path: &Path) -> io::Result<Vec<u8>> {
    let file = open_regular(path).await?;
    let len = file.metadata().await?.len();

    let mut bytes = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut bytes).await?;
    Ok(bytes)
}
