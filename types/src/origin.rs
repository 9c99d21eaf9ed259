//! Web origin type used as the cross-window trust boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A web origin: scheme + host (+ explicit port when non-default).
///
/// Origins compare by exact string equality only. Prefix or substring
/// matching would let `https://app.example.com.evil.net` through, so no
/// such helpers exist on this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin(String);

impl Origin {
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        // Trailing slashes would defeat exact matching against event origins.
        Self(s.trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_normalized() {
        assert_eq!(Origin::new("https://app.example.com/"), Origin::new("https://app.example.com"));
    }

    #[test]
    fn lookalike_origins_differ() {
        let trusted = Origin::new("https://app.example.com");
        assert_ne!(trusted, Origin::new("https://app.example.com.evil.net"));
        assert_ne!(trusted, Origin::new("http://app.example.com"));
        assert_ne!(trusted, Origin::new("https://app.example.com:8443"));
    }
}
