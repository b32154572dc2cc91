//! Tamper-evident token codec
//!
//! A token is `<payload>.<checksum>`:
//! - payload: standard base64 of the JSON form XORed with the key (key bytes repeated)
//! - checksum: base-36 of a 32-bit polynomial hash over `json + key`
//!
//! This is obfuscation with a checksum, not encryption. Anyone holding the key
//! (which ships with the page) can forge tokens.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Key used when none is injected at startup
pub const FALLBACK_KEY: &str = "blk-score-7f3a";

/// Separates payload from checksum
pub const SEPARATOR: char = '.';

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An encoded value with its checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    payload: String,
    checksum: String,
}

impl Token {
    /// Split a raw string into its two segments (no checksum verification)
    pub fn parse(raw: &str) -> Result<Self, CodecError> {
        let mut parts = raw.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(payload), Some(checksum), None) if !payload.is_empty() && !checksum.is_empty() => {
                Ok(Self {
                    payload: payload.to_string(),
                    checksum: checksum.to_string(),
                })
            }
            _ => Err(CodecError::MalformedToken),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.payload, SEPARATOR, self.checksum)
    }
}

/// Encodes values into tokens and verifies them on the way back
#[derive(Debug, Clone)]
pub struct Codec {
    key: String,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            key: FALLBACK_KEY.to_string(),
        }
    }
}

impl Codec {
    pub fn new(key: impl Into<String>) -> Result<Self, CodecError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CodecError::EmptyKey);
        }
        Ok(Self { key })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize `value` and wrap it in a token
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Token, CodecError> {
        let json = serde_json::to_string(value).map_err(|e| CodecError::Serialize(e.to_string()))?;
        Ok(Token {
            payload: STANDARD.encode(self.xor(json.as_bytes())),
            checksum: self.checksum(&json),
        })
    }

    /// Verify and deserialize a token, reporting why it was rejected
    pub fn try_decode<T: DeserializeOwned>(&self, raw: &str) -> Result<T, CodecError> {
        let token = Token::parse(raw)?;

        let cipher = STANDARD
            .decode(token.payload())
            .map_err(|e| CodecError::DecodeFailure(e.to_string()))?;
        let json = String::from_utf8(self.xor(&cipher))
            .map_err(|e| CodecError::DecodeFailure(e.to_string()))?;

        let actual = self.checksum(&json);
        if actual != token.checksum {
            return Err(CodecError::ChecksumMismatch {
                expected: token.checksum,
                actual,
            });
        }

        serde_json::from_str(&json).map_err(|e| CodecError::DecodeFailure(e.to_string()))
    }

    /// Verify and deserialize a token; `None` means rejected
    pub fn decode<T: DeserializeOwned>(&self, raw: &str) -> Option<T> {
        match self.try_decode(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Token rejected: {}", e);
                None
            }
        }
    }

    /// XOR with the key stream. Applying it twice is the identity.
    fn xor(&self, bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .zip(self.key.as_bytes().iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }

    fn checksum(&self, json: &str) -> String {
        to_base36(string_hash(json.encode_utf16().chain(self.key.encode_utf16())))
    }
}

/// 32-bit `h * 31 + unit` hash over UTF-16 code units, sign dropped
///
/// Matches the classic `(h << 5) - h + c` string hash, so tokens written by a
/// JavaScript build of the page verify here too.
pub fn string_hash(units: impl IntoIterator<Item = u16>) -> u32 {
    let hash = units
        .into_iter()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

/// Lowercase base-36 rendering
pub fn to_base36(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Progress {
        score: u64,
        label: String,
    }

    fn hash_str(s: &str) -> u32 {
        string_hash(s.encode_utf16())
    }

    #[test]
    fn test_string_hash_known_values() {
        assert_eq!(hash_str(""), 0);
        assert_eq!(hash_str("a"), 97);
        assert_eq!(hash_str("ab"), 97 * 31 + 98);
        assert_eq!(hash_str("hello"), 99_162_322);
        // Wraps to i32::MIN
        assert_eq!(hash_str("polygenelubricants"), 2_147_483_648);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(3105), "2e9");
        assert_eq!(to_base36(2_147_483_647), "zik0zj");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }

    #[test]
    fn test_round_trip_score_record() {
        let codec = Codec::default();
        let value = serde_json::json!({ "score": 42 });
        let token = codec.encode(&value).unwrap();
        let decoded: serde_json::Value = codec.decode(&token.to_string()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_round_trip_non_ascii() {
        let codec = Codec::new("ключ").unwrap();
        let value = Progress {
            score: 7,
            label: "niveau été ✓".to_string(),
        };
        let token = codec.encode(&value).unwrap();
        assert_eq!(codec.decode::<Progress>(&token.to_string()), Some(value));
    }

    #[test]
    fn test_token_shape() {
        let token = Codec::default().encode(&serde_json::json!({ "score": 1 })).unwrap();
        let raw = token.to_string();
        assert_eq!(raw.matches(SEPARATOR).count(), 1);
        assert!(!token.payload().is_empty());
        assert!(token.checksum().bytes().all(|b| BASE36_DIGITS.contains(&b)));
        assert_eq!(Token::parse(&raw).unwrap(), token);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = Codec::default();
        let value = serde_json::json!({ "score": 1234 });
        assert_eq!(codec.encode(&value).unwrap(), codec.encode(&value).unwrap());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert_eq!(Codec::new("").unwrap_err(), CodecError::EmptyKey);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = Codec::default();
        for raw in ["", "no-dot-here", "a.b.c", ".abc", "abc.", "."] {
            assert_eq!(
                codec.try_decode::<serde_json::Value>(raw),
                Err(CodecError::MalformedToken),
                "{raw:?}"
            );
            assert!(codec.decode::<serde_json::Value>(raw).is_none());
        }
    }

    #[test]
    fn test_garbage_base64_rejected() {
        let codec = Codec::default();
        let result = codec.try_decode::<serde_json::Value>("%%not*base64%%.1a2b");
        assert!(matches!(result, Err(CodecError::DecodeFailure(_))));
    }

    #[test]
    fn test_checksum_edit_rejected() {
        let codec = Codec::default();
        let token = codec.encode(&serde_json::json!({ "score": 5 })).unwrap();
        let forged = format!("{}.{}", token.payload(), "zzzz");
        assert!(matches!(
            codec.try_decode::<serde_json::Value>(&forged),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let ours = Codec::new("alpha").unwrap();
        let theirs = Codec::new("bravo").unwrap();
        let token = theirs.encode(&serde_json::json!({ "score": 5 })).unwrap();
        assert!(ours.decode::<serde_json::Value>(&token.to_string()).is_none());
    }

    #[test]
    fn test_valid_checksum_over_non_json_rejected() {
        let codec = Codec::default();
        let text = "score=99";
        let raw = format!(
            "{}.{}",
            STANDARD.encode(codec.xor(text.as_bytes())),
            codec.checksum(text)
        );
        assert!(matches!(
            codec.try_decode::<serde_json::Value>(&raw),
            Err(CodecError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_every_payload_flip_rejected() {
        let codec = Codec::default();
        let token = codec.encode(&serde_json::json!({ "score": 31337 })).unwrap();
        let raw = token.to_string();
        let payload_len = token.payload().len();

        for i in 0..payload_len {
            let mut chars: Vec<char> = raw.chars().collect();
            chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();
            assert!(
                codec.decode::<serde_json::Value>(&tampered).is_none(),
                "flip at {i} accepted: {tampered}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(score in any::<u64>(), label in "[a-zA-Z0-9 _-]{0,24}") {
            let codec = Codec::default();
            let value = Progress { score, label };
            let token = codec.encode(&value).unwrap();
            prop_assert_eq!(codec.decode::<Progress>(&token.to_string()), Some(value));
        }

        #[test]
        fn prop_payload_flip_rejected(
            score in any::<u64>(),
            index in any::<prop::sample::Index>(),
            replacement in prop::sample::select(
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/".to_vec()
            ),
        ) {
            let codec = Codec::default();
            let token = codec.encode(&serde_json::json!({ "score": score })).unwrap();
            let mut payload = token.payload().as_bytes().to_vec();
            let i = index.index(payload.len());
            prop_assume!(payload[i] != replacement);
            payload[i] = replacement;
            let tampered = format!("{}.{}", String::from_utf8(payload).unwrap(), token.checksum());
            prop_assert!(codec.decode::<serde_json::Value>(&tampered).is_none());
        }

        #[test]
        fn prop_decode_never_panics(raw in ".{0,64}") {
            let _ = Codec::default().decode::<serde_json::Value>(&raw);
        }
    }
}
