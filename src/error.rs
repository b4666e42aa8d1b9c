//! Error types for request execution and response decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`HttpClient`](crate::HttpClient) operations and
/// [`FetchResponse`](crate::FetchResponse) decoding.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The underlying transport failed (connection refused, timeout, TLS).
    /// `status` is 0 when no response was received at all.
    #[error("transport error (status {status}): {message}")]
    Transport { status: u16, message: String },

    /// A declared but unimplemented format was requested.
    #[error("{0} format is not implemented")]
    UnimplementedFormat(&'static str),

    /// The response body could not be decoded as JSON.
    #[error("malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A URL could not be parsed while building a request or resolving
    /// a redirect target.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A file attachment could not be read from disk.
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The request could not be constructed (e.g. an invalid MIME type on
    /// a file attachment).
    #[error("invalid request: {0}")]
    Request(String),
}

impl FetchError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        FetchError::Transport {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}
