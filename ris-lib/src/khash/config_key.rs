//! The process-wide configuration key that parameterizes KHASH.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::ascii85;
use crate::{RisError, Result};

/// A decoded and fingerprint-verified configuration key.
///
/// The key arrives Ascii85-encoded. It is decoded once, hashed with SHA-256
/// and compared against the expected lowercase hex fingerprint. A mismatch is
/// fatal.
#[derive(Clone)]
pub struct ConfigKey {
    key: Zeroizing<String>,
}

impl ConfigKey {
    /// Decode `encoded` and verify it against `expected_fingerprint`.
    pub fn from_encoded(encoded: &str, expected_fingerprint: &str) -> Result<Self> {
        if encoded.trim().is_empty() {
            tracing::error!("no configuration key set");
            return Err(RisError::configuration("no configuration key set"));
        }

        let bytes = Zeroizing::new(ascii85::decode(encoded)?);
        let key = std::str::from_utf8(&bytes)
            .map_err(|_| RisError::configuration("configuration key is not valid UTF-8"))?;

        let key = Self {
            key: Zeroizing::new(key.to_owned()),
        };
        if !key.fingerprint().eq_ignore_ascii_case(expected_fingerprint.trim()) {
            tracing::error!("the configuration key is incorrect");
            return Err(RisError::ConfigKeyMismatch);
        }
        Ok(key)
    }

    /// SHA-256 of the decoded key, lowercase hex.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.key.as_bytes()))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey").field("key", &"<redacted>").finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Ascii85 form of `ris-sdk-test-configuration-key`.
    pub(crate) const TEST_KEY_ENCODED: &str = r"EbTSHF(B&<FCfN8/Rr^:Anbn#Eaa'(Df..BAU+";
    pub(crate) const TEST_KEY_FINGERPRINT: &str =
        "873d2db501e91cd27e634ae2ab0a006f1fa7f47e025a6932fb78c98ef93a89cd";

    #[test]
    fn test_decodes_and_verifies() {
        let key = ConfigKey::from_encoded(TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT).unwrap();
        assert_eq!(key.expose(), "ris-sdk-test-configuration-key");
        assert_eq!(key.fingerprint(), TEST_KEY_FINGERPRINT);
    }

    #[test]
    fn test_fingerprint_comparison_ignores_case() {
        let upper = TEST_KEY_FINGERPRINT.to_uppercase();
        assert!(ConfigKey::from_encoded(TEST_KEY_ENCODED, &upper).is_ok());
    }

    #[test]
    fn test_fingerprint_mismatch_is_fatal() {
        let err = ConfigKey::from_encoded(TEST_KEY_ENCODED, &"0".repeat(64)).unwrap_err();
        assert!(matches!(err, RisError::ConfigKeyMismatch));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_key() {
        let err = ConfigKey::from_encoded("  ", TEST_KEY_FINGERPRINT).unwrap_err();
        assert!(matches!(err, RisError::Configuration(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ConfigKey::from_encoded(TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT).unwrap();
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("configuration-key"));
        assert!(rendered.contains("redacted"));
    }
}
