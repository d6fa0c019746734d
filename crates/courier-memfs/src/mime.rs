//! Extension-based MIME type guessing.

use camino::Utf8Path;

/// Type reported when the extension is unknown.
pub const FALLBACK: &str = "application/octet-stream";

/// Guesses the MIME type of `path` from its extension.
#[must_use]
pub fn guess(path: &Utf8Path) -> &'static str {
    let Some(extension) = path.extension() else {
        return FALLBACK;
    };
    match extension.to_ascii_lowercase().as_str() {
        "txt" | "text" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "toml" => "application/toml",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "rs" => "text/rust",
        _ => FALLBACK,
    }
}
