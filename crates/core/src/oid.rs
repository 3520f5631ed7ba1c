//! Git LFS object identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
pub const OID_LEN: usize = 64;

/// Validate a raw object identifier.
///
/// Accepts exactly 64 characters drawn from `[0-9a-f]`. Uppercase hex is
/// rejected: git-lfs always sends lowercase and storage keys are derived
/// from the OID verbatim.
pub fn validate_oid(oid: &str) -> crate::Result<()> {
    if oid.len() != OID_LEN {
        return Err(crate::Error::InvalidOid(format!(
            "expected {OID_LEN} hex chars, got {}",
            oid.len()
        )));
    }
    if let Some(c) = oid.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
        return Err(crate::Error::InvalidOid(format!(
            "invalid character in oid: {c:?}"
        )));
    }
    Ok(())
}

/// A validated SHA-256 object identifier (lowercase hex).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Parse and validate an OID.
    pub fn parse(oid: impl Into<String>) -> crate::Result<Self> {
        let oid = oid.into();
        validate_oid(&oid)?;
        Ok(Self(oid))
    }

    /// Compute the OID of some content.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Get the OID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two leading directory levels used when sharding object keys.
    pub fn shard(&self) -> (&str, &str) {
        (&self.0[..2], &self.0[2..4])
    }
}

impl TryFrom<String> for Oid {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", &self.0[..16])
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_lowercase_hex() {
        assert!(validate_oid(&"a".repeat(64)).is_ok());
        assert!(
            validate_oid("dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f")
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(validate_oid("").is_err());
        assert!(validate_oid("bad").is_err());
        assert!(validate_oid(&"a".repeat(63)).is_err());
        assert!(validate_oid(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_rejects_uppercase_and_non_hex() {
        assert!(validate_oid(&"A".repeat(64)).is_err());
        assert!(validate_oid(&"g".repeat(64)).is_err());
        let mut oid = "a".repeat(63);
        oid.push(' ');
        assert!(validate_oid(&oid).is_err());
    }

    #[test]
    fn test_rejects_multibyte_of_matching_byte_length() {
        // 32 two-byte characters are 64 bytes long
        assert!(validate_oid(&"é".repeat(32)).is_err());
    }

    #[test]
    fn test_compute_matches_known_digest() {
        let oid = Oid::compute(b"Hello, World!");
        assert_eq!(
            oid.as_str(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(oid.shard(), ("df", "fd"));
    }

    #[test]
    fn test_identical_content_has_identical_oid() {
        let data = vec![7u8; 4096];
        assert_eq!(Oid::compute(&data), Oid::compute(&data.clone()));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Oid, _> = serde_json::from_str(&format!("\"{}\"", "b".repeat(64)));
        assert!(ok.is_ok());
        let bad: Result<Oid, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
