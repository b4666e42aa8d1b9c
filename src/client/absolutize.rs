//! Relative URL resolution against a base URL.

use url::Url;

use crate::error::FetchError;

/// Resolve a possibly-relative `target` against `base`, returning a fully
/// qualified `scheme://authority/path` URL.
///
/// Resolution follows redirect-target conventions rather than strict
/// RFC 3986 reference resolution:
///
/// - a target carrying its own scheme is returned unchanged,
/// - `./x` and `../x` treat the base's final path segment as a resource
///   name and resolve from its parent directory,
/// - `/x` replaces the whole path,
/// - a bare `x` treats the base path as a directory and appends.
///
/// The base's query and fragment are never carried over. A base without a
/// path component resolves from the root.
pub fn absolutize_url(base: &str, target: &str) -> Result<String, FetchError> {
    // Location headers are frequently absolute already.
    if target.contains("://") {
        return Ok(target.to_string());
    }

    let base = Url::parse(base)?;
    let scheme = base.scheme();
    let host = base.host_str().unwrap_or_default();
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    if target.starts_with('/') {
        return Ok(format!("{scheme}://{authority}{target}"));
    }

    let mut segments: Vec<&str> = base.path().split('/').filter(|s| !s.is_empty()).collect();

    if target.starts_with("./") || target.starts_with("../") {
        // Parent directory of the base resource.
        segments.pop();

        let mut rest = target;
        loop {
            if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("../") {
                segments.pop();
                rest = stripped;
            } else {
                break;
            }
        }
        if !rest.is_empty() {
            segments.push(rest);
        }
    } else if !target.is_empty() {
        segments.push(target);
    }

    Ok(format!("{}://{}/{}", scheme, authority, segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_slash_resolves_from_parent() {
        assert_eq!(
            absolutize_url("http://h/a/b/c", "./d").unwrap(),
            "http://h/a/b/d"
        );
    }

    #[test]
    fn test_dot_dot_pops_one_segment_per_occurrence() {
        assert_eq!(
            absolutize_url("http://h/a/b/c", "../d").unwrap(),
            "http://h/a/d"
        );
        assert_eq!(
            absolutize_url("http://h/a/b/c", "../../d").unwrap(),
            "http://h/d"
        );
    }

    #[test]
    fn test_absolute_path_replaces_path() {
        assert_eq!(
            absolutize_url("http://h/a/b/c", "/x/y").unwrap(),
            "http://h/x/y"
        );
    }

    #[test]
    fn test_bare_relative_appends_to_directory() {
        assert_eq!(
            absolutize_url("http://h/a/b/c", "d").unwrap(),
            "http://h/a/b/c/d"
        );
    }

    #[test]
    fn test_absolute_target_passes_through() {
        assert_eq!(
            absolutize_url("http://h/a", "https://other/x").unwrap(),
            "https://other/x"
        );
    }

    #[test]
    fn test_base_without_path_resolves_from_root() {
        assert_eq!(absolutize_url("http://h", "d").unwrap(), "http://h/d");
        assert_eq!(absolutize_url("http://h", "./d").unwrap(), "http://h/d");
        assert_eq!(absolutize_url("http://h", "/d").unwrap(), "http://h/d");
    }

    #[test]
    fn test_port_is_preserved() {
        assert_eq!(
            absolutize_url("http://127.0.0.1:8080/a/b", "./c").unwrap(),
            "http://127.0.0.1:8080/a/c"
        );
        assert_eq!(
            absolutize_url("http://127.0.0.1:8080/a", "/c").unwrap(),
            "http://127.0.0.1:8080/c"
        );
    }

    #[test]
    fn test_base_query_not_carried_over() {
        assert_eq!(
            absolutize_url("http://h/a/b?q=1", "c").unwrap(),
            "http://h/a/b/c"
        );
    }

    #[test]
    fn test_target_query_kept_verbatim() {
        assert_eq!(
            absolutize_url("http://h/a/b", "./c?x=1").unwrap(),
            "http://h/a/c?x=1"
        );
    }

    #[test]
    fn test_invalid_base_is_an_error() {
        assert!(absolutize_url("not a url", "./d").is_err());
    }
}
