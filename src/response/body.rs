//! Body formats and decoded body variants.

use scraper::Html;

/// Decoding format selector for [`FetchResponse::body`](crate::FetchResponse::body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// The stored bytes, untouched.
    Raw,
    /// `serde_json` value.
    Json,
    /// Tolerantly parsed HTML document, traversable with CSS selectors.
    Html,
    /// File download view with content-disposition metadata.
    File,
    /// Declared but not implemented; always fails.
    Xml,
    /// Pick a format from the response content type.
    Auto,
}

impl BodyFormat {
    /// Fixed content-type dispatch table for auto-detection. Matching is on
    /// the media-type portion only, so charset parameters don't defeat it;
    /// unknown types fall back to raw.
    pub(crate) fn from_content_type(content_type: Option<&str>) -> BodyFormat {
        let media_type = content_type
            .map(|value| {
                value
                    .split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default();

        match media_type.as_str() {
            "application/plain" => BodyFormat::Raw,
            "application/json" => BodyFormat::Json,
            "text/xml" => BodyFormat::Xml,
            "text/html" => BodyFormat::Html,
            "application/pdf" => BodyFormat::File,
            _ => BodyFormat::Raw,
        }
    }
}

/// A decoded response body.
#[derive(Debug)]
pub enum Body {
    Raw(Vec<u8>),
    Json(serde_json::Value),
    Html(Html),
    File(FileBody),
}

impl Body {
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Body::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_html(&self) -> Option<&Html> {
        match self {
            Body::Html(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileBody> {
        match self {
            Body::File(file) => Some(file),
            _ => None,
        }
    }
}

/// File download view of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBody {
    /// Raw payload bytes.
    pub content: Vec<u8>,
    /// Downloaded size reported by the transport.
    pub size: u64,
    /// Declared MIME type, when the response carried one.
    pub mime: Option<String>,
    /// Filename from the `Content-Disposition` header, when present.
    pub name: Option<String>,
    /// `name` without its extension.
    pub basename: Option<String>,
    /// Extension of `name`; `None` when the filename has no dot.
    pub extension: Option<String>,
}

/// Split a filename at its last dot.
pub(crate) fn split_filename(name: &str) -> (String, Option<String>) {
    match name.rsplit_once('.') {
        Some((base, extension)) => (base.to_string(), Some(extension.to_string())),
        None => (name.to_string(), None),
    }
}
