//! Payment token obfuscation: KHASH and MASK.
//!
//! KHASH output must be bit-exact across SDK implementations, since merchants
//! correlate hashed tokens produced by different client libraries.
//!
//! # Algorithm
//!
//! ```text
//! digest = SHA1(token + "." + config_key)            (40 hex digits)
//! for i in 0, 2, 4, .., 26:
//!     out += ALPHABET[int(digest[i..i+7], 16) % 36]  (14 characters)
//! KHASH = token[0..6] + out                          (20 characters)
//! ```
//!
//! Gift cards use the merchant id in place of the 6-character prefix.
//!
//! # Example
//!
//! ```ignore
//! use ris_lib::khash::{ConfigKey, Khash};
//!
//! let key = ConfigKey::from_encoded(&encoded, &fingerprint)?;
//! let khash = Khash::new(key);
//! assert_eq!(khash.hash_payment_token("4111111111111111")?.len(), 20);
//! ```

mod ascii85;
mod config_key;

use sha1::{Digest, Sha1};

pub use config_key::ConfigKey;

use crate::{RisError, Result};

const ACCEPTABLE_CHARACTERS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Characters of the raw token kept in front of the hash.
pub const BIN_LENGTH: usize = 6;

/// Shortest token MASK accepts: 6 leading plus 4 trailing characters.
pub const MASK_MIN_LENGTH: usize = 10;

const LAST4_LENGTH: usize = 4;
const HASH_WINDOW: usize = 28;
const HEX_CHUNK: usize = 7;

/// KHASH obfuscator owning a verified configuration key.
///
/// Construct once at startup and share it (behind an `Arc`) with every client.
#[derive(Debug, Clone)]
pub struct Khash {
    key: ConfigKey,
}

impl Khash {
    /// Create an obfuscator from a verified key.
    pub fn new(key: ConfigKey) -> Self {
        Self { key }
    }

    /// Decode, verify and wrap an encoded configuration key.
    pub fn from_encoded(encoded: &str, expected_fingerprint: &str) -> Result<Self> {
        ConfigKey::from_encoded(encoded, expected_fingerprint).map(Self::new)
    }

    /// Hash a payment token, keeping its first six characters.
    pub fn hash_payment_token(&self, token: &str) -> Result<String> {
        let prefix: String = token.chars().take(BIN_LENGTH).collect();
        if prefix.chars().count() < BIN_LENGTH {
            return Err(RisError::TokenTooShort {
                length: token.chars().count(),
                minimum: BIN_LENGTH,
            });
        }
        Ok(prefix + &self.reduce(token))
    }

    /// Hash a gift card number, prefixing the merchant id instead of the token.
    pub fn hash_gift_card(&self, merchant_id: u64, token: &str) -> String {
        format!("{}{}", merchant_id, self.reduce(token))
    }

    /// The 14-character reduction of `SHA1(token + "." + key)`.
    fn reduce(&self, token: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(token.as_bytes());
        hasher.update(b".");
        hasher.update(self.key.expose().as_bytes());
        let digest = hasher.finalize();

        let nibbles: Vec<u32> = digest
            .iter()
            .flat_map(|b| [u32::from(b >> 4), u32::from(b & 0x0f)])
            .collect();

        (0..HASH_WINDOW)
            .step_by(2)
            .map(|i| {
                let value = nibbles[i..i + HEX_CHUNK]
                    .iter()
                    .fold(0u32, |acc, n| (acc << 4) | n);
                ACCEPTABLE_CHARACTERS[(value % 36) as usize] as char
            })
            .collect()
    }
}

/// Mask a token, keeping the first six and last four characters.
///
/// Tokens shorter than [`MASK_MIN_LENGTH`] are rejected.
pub fn mask_token(token: &str) -> Result<String> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < MASK_MIN_LENGTH {
        return Err(RisError::TokenTooShort {
            length: chars.len(),
            minimum: MASK_MIN_LENGTH,
        });
    }

    let tail = chars.len() - LAST4_LENGTH;
    let mut masked = String::with_capacity(chars.len());
    masked.extend(&chars[..BIN_LENGTH]);
    masked.extend(std::iter::repeat('X').take(tail - BIN_LENGTH));
    masked.extend(&chars[tail..]);
    Ok(masked)
}

/// Last four characters of a token, or an empty string for shorter tokens.
pub fn last4(token: &str) -> String {
    let count = token.chars().count();
    if count < LAST4_LENGTH {
        return String::new();
    }
    token.chars().skip(count - LAST4_LENGTH).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    pub(crate) use super::config_key::tests::{TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT};
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn test_khash() -> Khash {
        Khash::from_encoded(TEST_KEY_ENCODED, TEST_KEY_FINGERPRINT).unwrap()
    }

    #[test]
    fn test_hash_payment_token_vectors() {
        let khash = test_khash();
        assert_eq!(
            khash.hash_payment_token("4111111111111111").unwrap(),
            "41111128CFDMLHXX5Q0J"
        );
        assert_eq!(
            khash.hash_payment_token("5199185454061655").unwrap(),
            "5199183V6A7VOO96Y7OQ"
        );
        assert_eq!(
            khash.hash_payment_token("4259344583883").unwrap(),
            "425934Q4SCHWPC4DKHDZ"
        );
    }

    #[test]
    fn test_hash_gift_card_swaps_prefix() {
        let khash = test_khash();
        assert_eq!(
            khash.hash_gift_card(666666, "4111111111111111"),
            "66666628CFDMLHXX5Q0J"
        );
        assert_eq!(
            khash.hash_gift_card(666666, "4259344583883"),
            "666666Q4SCHWPC4DKHDZ"
        );
    }

    #[test]
    fn test_hash_rejects_short_token() {
        let err = test_khash().hash_payment_token("41111").unwrap_err();
        assert!(matches!(
            err,
            RisError::TokenTooShort {
                length: 5,
                minimum: 6
            }
        ));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("0007380568572514").unwrap(), "000738XXXXXX2514");
        assert_eq!(mask_token("370070538959797").unwrap(), "370070XXXXX9797");
        assert_eq!(mask_token("1234567890").unwrap(), "1234567890");
    }

    #[test]
    fn test_mask_rejects_short_token() {
        let err = mask_token("123456789").unwrap_err();
        assert!(matches!(
            err,
            RisError::TokenTooShort {
                length: 9,
                minimum: 10
            }
        ));
    }

    #[test]
    fn test_last4() {
        assert_eq!(last4("4111111111111111"), "1111");
        assert_eq!(last4("1234"), "1234");
        assert_eq!(last4("123"), "");
        assert_eq!(last4(""), "");
    }

    proptest! {
        #[test]
        fn prop_mask_preserves_edges(token in "[0-9A-Za-z]{10,40}") {
            let masked = mask_token(&token).unwrap();
            prop_assert_eq!(masked.len(), token.len());
            prop_assert_eq!(&masked[..6], &token[..6]);
            prop_assert_eq!(&masked[token.len() - 4..], &token[token.len() - 4..]);
            prop_assert!(masked[6..token.len() - 4].chars().all(|c| c == 'X'));
        }

        #[test]
        fn prop_hash_is_deterministic(token in "[0-9]{6,19}") {
            let khash = test_khash();
            let first = khash.hash_payment_token(&token).unwrap();
            let second = khash.hash_payment_token(&token).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), 20);
            prop_assert_eq!(&first[..6], &token[..6]);
            prop_assert!(first[6..].bytes().all(|b| ACCEPTABLE_CHARACTERS.contains(&b)));
        }
    }
}
