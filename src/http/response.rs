use std::time::SystemTime;

use anyhow::Context;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::mime::ContentType;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Outcome of path resolution. Decided once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 - the resolved file existed when checked
    Ok,
    /// 404 - the resolved file did not exist
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
        }
    }

    /// Reason phrase written on the status line.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "ERROR",
        }
    }

    pub fn status_line(&self) -> String {
        format!("{} {} {}\n", HTTP_VERSION, self.as_u16(), self.reason_phrase())
    }
}

/// Current moment as an IMF-fixdate in GMT, used for the `Date:` header and
/// the `<cs371date>` tag.
pub fn timestamp() -> String {
    httpdate::fmt_http_date(SystemTime::now())
}

/// Serializes the header block. Lines end with a bare `\n`; no
/// `Content-Length` is sent since the connection always closes.
pub fn serialize_header(
    status: StatusCode,
    content_type: ContentType,
    date: &str,
    server_name: &str,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);

    buf.extend_from_slice(status.status_line().as_bytes());

    let headers = [
        ("Date", date),
        ("Server", server_name),
        ("Connection", "close"),
        ("Content-Type", content_type.as_str()),
    ];
    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\n");

    buf
}

pub async fn write_header<W>(
    out: &mut W,
    status: StatusCode,
    content_type: ContentType,
    server_name: &str,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = serialize_header(status, content_type, &timestamp(), server_name);
    out.write_all(&header).await.context("writing response header")
}
