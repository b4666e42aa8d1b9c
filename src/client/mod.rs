//! HTTP client with cookie persistence and manual redirect following.
//!
//! Transport-level redirect following is disabled; redirects are handled
//! here so that HTML meta-refresh redirects can be followed with the same
//! budget as `Location` headers, and so the raw header block of the whole
//! chain stays visible to the caller.

mod absolutize;
mod cookies;
mod headers;
mod user_agent;

pub use absolutize::absolutize_url;
pub use cookies::FileCookieJar;
pub use headers::{parse_header_block, ParsedHeaders};
pub use user_agent::USER_AGENT;

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::request::{BodyEncoding, Method, ParamValue, Params};
use crate::response::{FetchResponse, TransferInfo};

const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Lenient meta-refresh detection, matching tags like
/// `<meta http-equiv="refresh" content="0; URL=/next" />`.
/// Known limitation: the pattern does not understand HTML structure and can
/// match inside scripts or comments.
static META_REFRESH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)http-equiv="refresh".+URL=(\S+)"\s*/>"#).expect("meta refresh pattern")
});

pub(crate) fn meta_refresh_target(body: &str) -> Option<&str> {
    META_REFRESH
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Cookie-jar-backed HTTP client.
///
/// Each public operation performs one logical exchange: the request itself
/// plus any redirects, up to the configured maximum, before returning a
/// [`FetchResponse`].
pub struct HttpClient {
    client: Client,
    jar: Arc<FileCookieJar>,
    max_redirects: u32,
}

impl HttpClient {
    /// Create a client persisting cookies at `cookie_jar` with the default
    /// redirect limit of 10.
    pub fn new(cookie_jar: impl Into<PathBuf>) -> Self {
        Self::with_max_redirects(cookie_jar, DEFAULT_MAX_REDIRECTS)
    }

    /// Create a client with an explicit redirect limit.
    pub fn with_max_redirects(cookie_jar: impl Into<PathBuf>, max_redirects: u32) -> Self {
        let jar = Arc::new(FileCookieJar::open(cookie_jar));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(jar.clone())
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            jar,
            max_redirects,
        }
    }

    /// The cookie jar backing this client.
    pub fn cookie_jar(&self) -> &FileCookieJar {
        &self.jar
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    pub fn set_max_redirects(&mut self, max_redirects: u32) {
        self.max_redirects = max_redirects;
    }

    pub async fn get(&self, url: &str, params: &Params) -> Result<FetchResponse, FetchError> {
        self.request(url, Method::Get, params, BodyEncoding::Form)
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        params: &Params,
        encoding: BodyEncoding,
    ) -> Result<FetchResponse, FetchError> {
        self.request(url, Method::Post, params, encoding).await
    }

    pub async fn put(
        &self,
        url: &str,
        params: &Params,
        encoding: BodyEncoding,
    ) -> Result<FetchResponse, FetchError> {
        self.request(url, Method::Put, params, encoding).await
    }

    pub async fn delete(&self, url: &str, params: &Params) -> Result<FetchResponse, FetchError> {
        self.request(url, Method::Delete, params, BodyEncoding::Form)
            .await
    }

    pub async fn options(&self, url: &str, params: &Params) -> Result<FetchResponse, FetchError> {
        self.request(url, Method::Options, params, BodyEncoding::Form)
            .await
    }

    /// Run one exchange: initial request plus redirects.
    ///
    /// Redirect precedence per hop: a `Location` header wins; only when no
    /// `Location` is present is the body scanned for a meta-refresh tag.
    /// Both paths draw from the same budget, and an exhausted budget returns
    /// the response as-is rather than failing.
    async fn request(
        &self,
        url: &str,
        method: Method,
        params: &Params,
        encoding: BodyEncoding,
    ) -> Result<FetchResponse, FetchError> {
        let encoding = encoding.resolve(params);
        if method.takes_body() && encoding == BodyEncoding::Xml {
            return Err(FetchError::UnimplementedFormat("xml"));
        }

        let mut current_url = url.to_string();
        let mut current_method = method;
        let mut first_hop = true;
        let mut redirects_left = self.max_redirects;
        let mut header_block = String::new();

        loop {
            let url_to_go = if !current_method.takes_body() && first_hop && !params.is_empty() {
                append_query(&current_url, params)
            } else {
                current_url.clone()
            };

            let mut request = self.client.request(current_method.as_reqwest(), &url_to_go);
            if first_hop && current_method.takes_body() {
                request = match encoding {
                    BodyEncoding::Form => request.form(&text_params(params)),
                    BodyEncoding::Json => request
                        .header(ACCEPT, "application/json")
                        .json(&json_params(params)),
                    BodyEncoding::JsonRpc => request
                        .header(CONTENT_TYPE, "application/json-rpc")
                        .header(ACCEPT, "application/json-rpc")
                        .body(serde_json::to_string(&json_params(params))?),
                    BodyEncoding::Multipart => request.multipart(multipart_form(params).await?),
                    // Rejected above before any I/O.
                    BodyEncoding::Xml => return Err(FetchError::UnimplementedFormat("xml")),
                };
            }

            let response = request.send().await.map_err(FetchError::transport)?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let hop_location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());

            append_raw_headers(&mut header_block, &response);

            let body = response
                .bytes()
                .await
                .map_err(FetchError::transport)?
                .to_vec();

            if let Some(location) = hop_location {
                if redirects_left > 0 {
                    redirects_left -= 1;
                    let next = absolutize_url(&url_to_go, &location)?;
                    debug!("following Location redirect {} -> {}", url_to_go, next);
                    current_url = next;
                    current_method = Method::Get;
                    first_hop = false;
                    continue;
                }
                debug!(
                    "redirect limit reached at {}, returning response as-is",
                    url_to_go
                );
            } else {
                let body_text = String::from_utf8_lossy(&body);
                if let Some(target) = meta_refresh_target(&body_text) {
                    if redirects_left > 0 {
                        redirects_left -= 1;
                        let next = absolutize_url(&url_to_go, target)?;
                        debug!("following meta refresh {} -> {}", url_to_go, next);
                        current_url = next;
                        current_method = Method::Get;
                        first_hop = false;
                        continue;
                    }
                    debug!(
                        "redirect limit reached at {} (meta refresh), returning response as-is",
                        url_to_go
                    );
                }
            }

            let info = TransferInfo {
                status,
                content_type,
                size_download: body.len() as u64,
                header_size: header_block.len(),
            };
            let headers = parse_header_block(&header_block);
            return Ok(FetchResponse::new(body, info, current_url, headers));
        }
    }
}

/// Serialize text params as a query string and glue it onto the URL,
/// `&`-joined when the URL already carries a query. File attachments have
/// no query representation and are skipped.
fn append_query(url: &str, params: &Params) -> String {
    let query = params
        .iter()
        .filter_map(|(key, value)| match value {
            ParamValue::Text(text) => Some(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(text)
            )),
            ParamValue::File(_) => None,
        })
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        url.to_string()
    } else {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{query}")
    }
}

fn text_params(params: &Params) -> Vec<(&str, &str)> {
    params
        .iter()
        .filter_map(|(key, value)| match value {
            ParamValue::Text(text) => Some((key.as_str(), text.as_str())),
            ParamValue::File(_) => None,
        })
        .collect()
}

fn json_params(params: &Params) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .filter_map(|(key, value)| match value {
            ParamValue::Text(text) => {
                Some((key.clone(), serde_json::Value::String(text.clone())))
            }
            ParamValue::File(_) => None,
        })
        .collect();
    serde_json::Value::Object(map)
}

async fn multipart_form(params: &Params) -> Result<reqwest::multipart::Form, FetchError> {
    let mut form = reqwest::multipart::Form::new();
    for (key, value) in params {
        form = match value {
            ParamValue::Text(text) => form.text(key.clone(), text.clone()),
            ParamValue::File(upload) => {
                let bytes =
                    tokio::fs::read(&upload.path)
                        .await
                        .map_err(|source| FetchError::Attachment {
                            path: upload.path.clone(),
                            source,
                        })?;
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name(upload.filename.clone())
                    .mime_str(&upload.mime)
                    .map_err(|err| {
                        FetchError::Request(format!("invalid MIME type {:?}: {}", upload.mime, err))
                    })?;
                form.part(key.clone(), part)
            }
        };
    }
    Ok(form)
}

/// Append this hop's status line and headers to the accumulated raw block,
/// reconstructing the folded header text the parser operates on.
fn append_raw_headers(block: &mut String, response: &reqwest::Response) {
    let status = response.status();
    block.push_str(version_str(response.version()));
    block.push(' ');
    block.push_str(&status.as_u16().to_string());
    if let Some(reason) = status.canonical_reason() {
        block.push(' ');
        block.push_str(reason);
    }
    block.push_str("\r\n");

    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            block.push_str(&format!("{name}: {value}\r\n"));
        }
    }
    block.push_str("\r\n");
}

fn version_str(version: reqwest::Version) -> &'static str {
    if version == reqwest::Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == reqwest::Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == reqwest::Version::HTTP_2 {
        "HTTP/2.0"
    } else if version == reqwest::Version::HTTP_3 {
        "HTTP/3.0"
    } else {
        "HTTP/1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FileUpload;

    #[test]
    fn test_meta_refresh_extraction() {
        let html = r#"<html><head>
            <meta http-equiv="refresh" content="0; URL=/next" />
        </head></html>"#;
        assert_eq!(meta_refresh_target(html), Some("/next"));
    }

    #[test]
    fn test_meta_refresh_case_insensitive() {
        let html = r#"<META HTTP-EQUIV="refresh" CONTENT="5; URL=http://x/y"/>"#;
        assert_eq!(meta_refresh_target(html), Some("http://x/y"));
    }

    #[test]
    fn test_meta_refresh_absent() {
        assert_eq!(meta_refresh_target("<html><body>plain</body></html>"), None);
    }

    #[test]
    fn test_append_query_uses_question_mark() {
        let params = Params::from([("q".to_string(), ParamValue::text("a b"))]);
        assert_eq!(append_query("http://h/s", &params), "http://h/s?q=a%20b");
    }

    #[test]
    fn test_append_query_joins_existing_query_with_ampersand() {
        let params = Params::from([("b".to_string(), ParamValue::text("2"))]);
        assert_eq!(append_query("http://h/s?a=1", &params), "http://h/s?a=1&b=2");
    }

    #[test]
    fn test_append_query_skips_files() {
        let params = Params::from([(
            "doc".to_string(),
            FileUpload::new("/tmp/x", "text/plain", "x").into(),
        )]);
        assert_eq!(append_query("http://h/s", &params), "http://h/s");
    }

    #[test]
    fn test_json_params_only_text_values() {
        let params = Params::from([
            ("a".to_string(), ParamValue::text("1")),
            (
                "doc".to_string(),
                FileUpload::new("/tmp/x", "text/plain", "x").into(),
            ),
        ]);
        let value = json_params(&params);
        assert_eq!(value, serde_json::json!({"a": "1"}));
    }
}
