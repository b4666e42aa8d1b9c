//! File-persisted cookie jar.
//!
//! Cookies are kept in origin-keyed buckets and rewritten to a JSON file
//! after every response that sets one, so sequential clients pointed at the
//! same jar path share a session. There is no file locking; concurrent
//! writers race on the file and the design assumes a single writer per path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CookieEntry {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    expires: Option<String>,
}

/// On-disk layout of the jar file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct JarFile {
    origins: HashMap<String, Vec<CookieEntry>>,
}

/// Cookie jar persisted to a JSON file, usable as a reqwest cookie provider.
pub struct FileCookieJar {
    path: PathBuf,
    entries: RwLock<HashMap<String, Vec<CookieEntry>>>,
}

impl FileCookieJar {
    /// Open a jar backed by `path`, loading any cookies already stored
    /// there. A missing or unreadable file starts an empty jar.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<JarFile>(&contents)
                .map(|file| file.origins)
                .unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persistence cannot fail the exchange; failures are logged and the
    /// in-memory jar stays authoritative.
    fn persist(&self, entries: &HashMap<String, Vec<CookieEntry>>) {
        let file = JarFile {
            origins: entries.clone(),
        };
        match serde_json::to_string_pretty(&file) {
            Ok(contents) => {
                if let Err(err) = fs::write(&self.path, contents) {
                    warn!(
                        "failed to write cookie jar {}: {}",
                        self.path.display(),
                        err
                    );
                }
            }
            Err(err) => warn!("failed to serialize cookie jar: {}", err),
        }
    }
}

/// Parse one `Set-Cookie` header value into an entry.
///
/// Attribute handling is deliberately small: path, domain, expires and the
/// secure flag. Anything else is ignored.
fn parse_set_cookie(raw: &str, default_path: &str) -> Option<CookieEntry> {
    let (name, rest) = raw.split_once('=')?;
    let mut parts = rest.split(';');

    let mut cookie = CookieEntry {
        name: name.trim().to_string(),
        value: parts.next()?.trim().to_string(),
        domain: None,
        path: None,
        secure: false,
        expires: None,
    };
    if cookie.name.is_empty() {
        return None;
    }

    for part in parts {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(value.trim().to_string()),
                "domain" => cookie.domain = Some(value.trim().trim_start_matches('.').to_string()),
                "expires" => cookie.expires = Some(value.trim().to_string()),
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        }
    }

    if cookie.path.is_none() {
        cookie.path = Some(default_path.to_string());
    }
    Some(cookie)
}

impl CookieStore for FileCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let origin = url.origin().ascii_serialization();
        let default_path = url
            .path()
            .rsplit_once('/')
            .map_or("/", |(dir, _)| if dir.is_empty() { "/" } else { dir });

        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        let mut changed = false;
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else { continue };
            let Some(cookie) = parse_set_cookie(raw, default_path) else {
                continue;
            };

            let bucket = entries.entry(origin.clone()).or_default();
            if let Some(existing) = bucket.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie;
            } else {
                bucket.push(cookie);
            }
            changed = true;
        }

        if changed {
            self.persist(&entries);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let origin = url.origin().ascii_serialization();
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let is_https = url.scheme() == "https";

        let entries = self.entries.read().ok()?;
        let cookies = entries.get(&origin)?;

        let header = cookies
            .iter()
            .filter(|cookie| match &cookie.domain {
                Some(domain) => host == domain || host.ends_with(&format!(".{domain}")),
                None => true,
            })
            .filter(|cookie| match &cookie.path {
                Some(cookie_path) => path.starts_with(cookie_path.as_str()),
                None => true,
            })
            .filter(|cookie| !cookie.secure || is_https)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            HeaderValue::from_str(&header).ok()
        }
    }
}
