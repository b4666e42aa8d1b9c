//! Content-Disposition filename extraction.

/// Parse the filename out of a `Content-Disposition` header value.
///
/// Handles both the plain `filename="name.pdf"` form (quoted or not) and
/// the RFC 5987 `filename*=UTF-8''name.pdf` form, preferring the latter.
pub fn parse_content_disposition_filename(header: &str) -> Option<String> {
    // RFC 5987 encoded form first.
    if let Some(start) = header.find("filename*=") {
        let rest = &header[start + "filename*=".len()..];
        if let Some(separator) = rest.find("''") {
            if let Some(encoded) = rest[separator + 2..].split([';', ' ']).next() {
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    let filename = decoded.trim();
                    if !filename.is_empty() {
                        return Some(filename.to_string());
                    }
                }
            }
        }
    }

    // Plain form: split on `;` fields, take the value after `=`, trim quotes.
    if let Some(start) = header.find("filename=") {
        let rest = &header[start + "filename=".len()..];
        let filename = match rest.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next(),
            None => rest.split([';', ' ']).next(),
        };
        if let Some(name) = filename {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    None
}
