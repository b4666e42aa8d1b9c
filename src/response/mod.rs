//! Response record and format-aware body decoding.

mod body;
mod disposition;

pub use body::{Body, BodyFormat, FileBody};
pub use disposition::parse_content_disposition_filename;

use std::borrow::Cow;

use scraper::Html;

use crate::client::ParsedHeaders;
use crate::error::FetchError;

/// Transport metadata of the terminal response in an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    /// HTTP status of the final hop.
    pub status: u16,
    /// Content type of the final hop, as sent by the server.
    pub content_type: Option<String>,
    /// Body size in bytes as downloaded.
    pub size_download: u64,
    /// Byte length of the accumulated raw header block.
    pub header_size: usize,
}

/// An immutable HTTP response with lazy, format-selectable body decoding.
///
/// Decoded views are computed on every [`body`](Self::body) call and never
/// cached; decoding is cheap next to the network round trip.
#[derive(Debug)]
pub struct FetchResponse {
    body: Vec<u8>,
    info: TransferInfo,
    last_url: String,
    headers: ParsedHeaders,
}

impl FetchResponse {
    pub(crate) fn new(
        body: Vec<u8>,
        info: TransferInfo,
        last_url: String,
        headers: ParsedHeaders,
    ) -> Self {
        Self {
            body,
            info,
            last_url,
            headers,
        }
    }

    /// The stored body bytes, exactly as received.
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    /// Lossy UTF-8 view of the body.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body per `format`.
    ///
    /// JSON decoding of a malformed payload fails with
    /// [`FetchError::Decode`]; the raw body stays available through
    /// [`raw_body`](Self::raw_body) regardless. HTML parsing is tolerant and
    /// never fails on recoverable markup errors. XML is declared but
    /// unimplemented.
    pub fn body(&self, format: BodyFormat) -> Result<Body, FetchError> {
        match format {
            BodyFormat::Raw => Ok(Body::Raw(self.body.clone())),
            BodyFormat::Json => Ok(Body::Json(serde_json::from_slice(&self.body)?)),
            BodyFormat::Html => Ok(Body::Html(Html::parse_document(&self.body_text()))),
            BodyFormat::File => Ok(Body::File(self.file_body())),
            BodyFormat::Xml => Err(FetchError::UnimplementedFormat("xml")),
            BodyFormat::Auto => {
                self.body(BodyFormat::from_content_type(self.info.content_type.as_deref()))
            }
        }
    }

    fn file_body(&self) -> FileBody {
        let name = self
            .headers
            .get("content-disposition")
            .and_then(parse_content_disposition_filename);
        let (basename, extension) = match &name {
            Some(name) => {
                let (base, ext) = body::split_filename(name);
                (Some(base), ext)
            }
            None => (None, None),
        };

        FileBody {
            content: self.body.clone(),
            size: self.info.size_download,
            mime: self.info.content_type.clone(),
            name,
            basename,
            extension,
        }
    }

    /// Parsed headers of the exchange.
    pub fn headers(&self) -> &ParsedHeaders {
        &self.headers
    }

    /// Transport metadata of the final hop.
    pub fn info(&self) -> &TransferInfo {
        &self.info
    }

    /// The URL the final request was issued against.
    pub fn last_url(&self) -> &str {
        &self.last_url
    }
}
