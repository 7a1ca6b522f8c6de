use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::StaticFilesConfig;
use crate::http::mime::ContentType;
use crate::http::response::StatusCode;

/// Everything decided about one request before any byte is written back.
///
/// Built once by [`RequestContext::resolve`] and then only read by the
/// header and body stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The request path, with `/` replaced by the default document.
    pub path: String,
    /// Root directory concatenated with `path`.
    pub file_path: PathBuf,
    pub status: StatusCode,
    /// Always `Html` when `status` is `NotFound`.
    pub content_type: ContentType,
    /// Set when the path was classified as `image/x-icon`.
    pub is_favicon: bool,
}

impl RequestContext {
    /// Resolves a raw request path against the configured root.
    ///
    /// The existence check is advisory: the file may still vanish before the
    /// body is written, and the body stage copes with that.
    pub async fn resolve(raw_path: &str, cfg: &StaticFilesConfig) -> Self {
        let path = normalize_path(raw_path, &cfg.default_document);
        let file_path = concat_path(&cfg.root, &path);

        let status = if is_servable(&path) && tokio::fs::metadata(&file_path).await.is_ok() {
            StatusCode::Ok
        } else {
            StatusCode::NotFound
        };

        Self::classify(path, file_path, status)
    }

    /// Assigns the content type once the status is known.
    pub fn classify(path: String, file_path: PathBuf, status: StatusCode) -> Self {
        let content_type = match status {
            StatusCode::Ok => ContentType::classify(&path),
            StatusCode::NotFound => ContentType::Html,
        };

        Self {
            path,
            file_path,
            status,
            content_type,
            is_favicon: content_type == ContentType::Icon,
        }
    }
}

/// Maps `/` to `/<default_document>`; every other path is kept as is.
pub fn normalize_path(raw_path: &str, default_document: &str) -> String {
    if raw_path == "/" {
        format!("/{}", default_document)
    } else {
        raw_path.to_string()
    }
}

/// Plain string concatenation of root and request path, so `/a.html` under
/// root `/srv` becomes `/srv/a.html`.
pub fn concat_path(root: &Path, path: &str) -> PathBuf {
    let mut joined = OsString::from(root.as_os_str());
    joined.push(path);
    PathBuf::from(joined)
}

/// Empty paths and paths with a `..` segment never resolve to a file.
fn is_servable(path: &str) -> bool {
    !path.is_empty() && !path.split('/').any(|segment| segment == "..")
}
