//! Content types by file extension
//!
//! Also reads the `download` query flag, which overrides the table.

/// Content type for a served file
///
/// A `download` request forces `application/octet-stream`; unknown
/// extensions are served as plain text.
pub fn content_type(path: &str, download: bool) -> &'static str {
    if download {
        return "application/octet-stream";
    }

    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        _ => "text/plain",
    }
}

/// Check a raw query string for an argument, with or without a value
/// (`download`, `download=1`)
pub fn has_arg(query: Option<&str>, name: &str) -> bool {
    query
        .map(|q| q.split('&').any(|pair| pair.split('=').next() == Some(name)))
        .unwrap_or(false)
}
