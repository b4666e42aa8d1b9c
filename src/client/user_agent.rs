//! User agent for outgoing requests.

/// Fixed descriptive user agent sent on every request.
pub const USER_AGENT: &str = "webfetch/0.3 (github.com/monokrome/webfetch)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_identifies_crate() {
        assert!(USER_AGENT.starts_with("webfetch/"));
    }
}
