//! Request descriptor types: methods, parameter values, body encodings.

use std::collections::HashMap;
use std::path::PathBuf;

/// Request parameters, keyed by field name. Order is irrelevant.
pub type Params = HashMap<String, ParamValue>;

/// HTTP methods supported by the request routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }

    /// Body-bearing methods serialize params into the request body;
    /// the rest append them to the query string.
    pub(crate) fn takes_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// Serialization of the parameter map into an outgoing request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded` key/value pairs.
    #[default]
    Form,
    /// JSON object body with `application/json` Accept/Content-Type.
    Json,
    /// JSON object body with `application/json-rpc` Accept/Content-Type.
    JsonRpc,
    /// `multipart/form-data` with file attachments.
    Multipart,
    /// Declared but not implemented; always fails.
    Xml,
}

impl BodyEncoding {
    /// Any file attachment in the parameter map forces multipart encoding,
    /// whatever the caller asked for.
    pub(crate) fn resolve(self, params: &Params) -> BodyEncoding {
        if params.values().any(|v| matches!(v, ParamValue::File(_))) {
            BodyEncoding::Multipart
        } else {
            self
        }
    }
}

/// A file to upload: path on disk, MIME type, and the filename declared
/// to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub path: PathBuf,
    pub mime: String,
    pub filename: String,
}

impl FileUpload {
    pub fn new(
        path: impl Into<PathBuf>,
        mime: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
            filename: filename.into(),
        }
    }
}

/// A single parameter value: either a scalar or a file attachment marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    File(FileUpload),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<FileUpload> for ParamValue {
    fn from(value: FileUpload) -> Self {
        ParamValue::File(value)
    }
}
