//! Secret values supplied by users (search keys, storage account tokens).

use std::fmt;

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// An opaque user secret.
///
/// `Debug` and `Display` never print the value; use [`Credential::expose`]
/// at the few places that must hand the raw string to an upstream API or
/// embed it into a resolution token.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short stable identifier for log correlation.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        format!("{:x}", digest)[..8].to_string()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted:{}>)", self.fingerprint())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak() {
        let credential = Credential::new("super-secret-token");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("redacted"));
        assert_eq!(format!("{}", credential), "<redacted>");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Credential::new("abc");
        let b = Credential::new("abc");
        let c = Credential::new("abd");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 8);
    }

    #[test]
    fn test_deserialize_transparent() {
        let credential: Credential = serde_json::from_str("\"key-123\"").unwrap();
        assert_eq!(credential.expose(), "key-123");
        assert!(!credential.is_empty());
        assert!(Credential::new("  ").is_empty());
    }
}
