//! Raw header block parsing.
//!
//! A fetch accumulates one raw header block across all redirect hops, the
//! way curl folds intermediate responses when it follows redirects itself.
//! Parsing captures two things from that block: the header map of the final
//! success response, and the last redirect target seen anywhere.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static LOCATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Location:\s+(\S+)$").expect("location pattern"));

static OK_STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^HTTP/\d\.\d\s200\sOK$").expect("status pattern"));

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+):\s(.+)$").expect("header pattern"));

/// Headers extracted from a raw header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    /// Header lines appearing after the first `200 OK` status line.
    /// Keys keep the case found in the block; the last occurrence of a
    /// repeated key wins.
    pub all: HashMap<String, String>,
    /// The last `Location:` value seen anywhere in the block, gate or not.
    pub location: Option<String>,
}

impl ParsedHeaders {
    /// Case-insensitive lookup in `all`. Live blocks carry lowercase names
    /// (the `http` crate normalizes them); hand-written blocks may not.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.all
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a raw header block, line by line.
///
/// Capturing into the full map only starts once a `HTTP/x.y 200 OK` status
/// line has been seen, so headers of intermediate redirect responses folded
/// into the block are ignored. `Location:` is captured regardless.
pub fn parse_header_block(block: &str) -> ParsedHeaders {
    let mut capturing = false;
    let mut all = HashMap::new();
    let mut location = None;

    for line in block.lines() {
        let line = line.trim();

        if let Some(captures) = LOCATION_LINE.captures(line) {
            location = captures.get(1).map(|m| m.as_str().to_string());
        }

        if OK_STATUS_LINE.is_match(line) {
            capturing = true;
        }
        if capturing {
            if let Some(captures) = HEADER_LINE.captures(line) {
                if let (Some(key), Some(value)) = (captures.get(1), captures.get(2)) {
                    all.insert(key.as_str().to_string(), value.as_str().to_string());
                }
            }
        }
    }

    ParsedHeaders { all, location }
}
