use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::SHA256_PREFIX;

/// Errors produced when a string cannot be accepted as a SHA-256 digest.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion is not exactly 64 characters long.
    #[error("Invalid SHA256 digest: expected 64 hex characters, got {len} in '{input}'")]
    InvalidLength {
        /// Length of the hex portion that was supplied.
        len: usize,
        /// The rejected input.
        input: String,
    },

    /// The hex portion contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid SHA256 digest: contains non-hex characters in '{0}'")]
    NonHex(String),

    /// The value carries an algorithm prefix other than `sha256:`.
    #[error("Unsupported digest algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

/// A validated SHA256 digest (64 lowercase hex characters).
///
/// Every checksum the resolver hands back goes through this type, so an
/// instance can never hold a placeholder, a truncated value, or a digest
/// produced by another algorithm. It renders and serializes in the
/// normalized `sha256:<hex>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix and in either
    /// hex case. The stored form is always lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if another algorithm prefix is present or the hex
    /// portion is not exactly 64 ASCII hex characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DigestError> {
        let s = s.as_ref().trim();
        let hex = match s.split_once(':') {
            Some((algo, rest)) if algo.eq_ignore_ascii_case("sha256") => rest,
            Some((algo, _)) => return Err(DigestError::UnsupportedAlgorithm(algo.to_string())),
            None => s,
        };

        if hex.len() != 64 {
            return Err(DigestError::InvalidLength {
                len: hex.len(),
                input: s.to_string(),
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s.to_string()));
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Parse a checksum that must already be in canonical form.
    ///
    /// Unlike [`Sha256Digest::new`] this rejects missing prefixes and
    /// uppercase hex: it answers "is this value exactly
    /// `sha256:[a-f0-9]{64}`".
    pub fn parse_canonical(s: &str) -> Option<Self> {
        let hex = s.strip_prefix(SHA256_PREFIX)?;
        let canonical = hex.len() == 64
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        canonical.then(|| Self(hex.to_string()))
    }

    /// Compute the SHA256 digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Build a digest from a finished hasher state.
    pub fn from_hasher(hasher: Sha256) -> Self {
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the bare 64-character hex string.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Render the normalized `sha256:<hex>` form.
    pub fn to_prefixed(&self) -> String {
        format!("{SHA256_PREFIX}{}", self.0)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SHA256_PREFIX}{}", self.0)
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_prefixed())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn accepts_bare_and_prefixed_hex() {
        let bare = Sha256Digest::new(HEX).unwrap();
        let prefixed = Sha256Digest::new(format!("sha256:{HEX}")).unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.to_string(), format!("sha256:{HEX}"));
    }

    #[test]
    fn normalizes_uppercase() {
        let digest = Sha256Digest::new(HEX.to_uppercase()).unwrap();
        assert_eq!(digest.as_hex(), HEX);
    }

    #[test]
    fn rejects_wrong_length_and_algorithm() {
        assert!(matches!(
            Sha256Digest::new("abc123"),
            Err(DigestError::InvalidLength { len: 6, .. })
        ));
        assert!(matches!(
            Sha256Digest::new(format!("sha512:{HEX}")),
            Err(DigestError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            Sha256Digest::new("z".repeat(64)),
            Err(DigestError::NonHex(_))
        ));
    }

    #[test]
    fn canonical_parse_is_strict() {
        assert!(Sha256Digest::parse_canonical(&format!("sha256:{HEX}")).is_some());
        assert!(Sha256Digest::parse_canonical(HEX).is_none());
        assert!(Sha256Digest::parse_canonical(&format!("sha256:{}", HEX.to_uppercase())).is_none());
        assert!(Sha256Digest::parse_canonical("sha256:placeholder").is_none());
    }

    #[test]
    fn compute_matches_known_vector() {
        // sha256("test")
        assert_eq!(Sha256Digest::compute(b"test").as_hex(), HEX);
    }

    #[test]
    fn serde_uses_prefixed_form() {
        let digest = Sha256Digest::new(HEX).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"sha256:{HEX}\""));
        let back: Sha256Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }
}
