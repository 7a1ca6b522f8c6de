/// Content types this server can label a response with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Gif,
    Jpeg,
    Png,
    Icon,
}

/// Extension tokens checked in order; the first one found anywhere in the
/// path wins.
const RULES: &[(&str, ContentType)] = &[
    (".html", ContentType::Html),
    (".gif", ContentType::Gif),
    (".jpeg", ContentType::Jpeg),
    (".jpg", ContentType::Jpeg),
    (".png", ContentType::Png),
    (".ico", ContentType::Icon),
];

impl ContentType {
    /// Classifies a request path by substring match, not by suffix, so
    /// `/a.html.bak` is HTML. Unknown paths default to HTML.
    pub fn classify(path: &str) -> Self {
        RULES
            .iter()
            .find(|(token, _)| path.contains(token))
            .map(|(_, content_type)| *content_type)
            .unwrap_or(ContentType::Html)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Gif => "image/gif",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Png => "image/png",
            ContentType::Icon => "image/x-icon",
        }
    }

    pub fn is_image(&self) -> bool {
        self.as_str().starts_with("image")
    }
}
