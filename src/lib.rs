//! Cookie-jar-backed HTTP fetching with manual redirect following and
//! format-aware response decoding.
//!
//! [`HttpClient`] executes one logical exchange per call: it sends the
//! request with transport-level redirects disabled, follows `Location`
//! headers and HTML meta-refresh tags itself up to a configured limit, and
//! persists cookies to a file between calls. The resulting
//! [`FetchResponse`] decodes its body on demand as raw bytes, JSON, an HTML
//! document, or a file download with content-disposition metadata.

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{absolutize_url, parse_header_block, FileCookieJar, HttpClient, ParsedHeaders, USER_AGENT};
pub use error::FetchError;
pub use request::{BodyEncoding, FileUpload, Method, ParamValue, Params};
pub use response::{
    parse_content_disposition_filename, Body, BodyFormat, FetchResponse, FileBody, TransferInfo,
};
