//! # Secret Values
//!
//! The payload that flows between the secret store and the rotation capabilities.
//!
//! A secret is either textual or binary, never both. Consumers read the raw bytes
//! through [`Secret::value`] and only look at the variant when the encoding matters,
//! for example when storing a new pending version.
//!
//! Payloads are zeroed from memory when a `Secret` is dropped and are never printed
//! by `Debug`.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret payload as stored in a secret store version.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Secret {
    /// Stored as a string payload (`SecretString`)
    Text(String),
    /// Stored as a binary payload (`SecretBinary`), base64 in JSON
    Binary(
        #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
        Vec<u8>,
    ),
}

impl Secret {
    /// Raw bytes of the payload, whichever variant holds it.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        match self {
            Secret::Text(text) => text.as_bytes(),
            Secret::Binary(bytes) => bytes,
        }
    }

    /// Whether this secret must be stored as a binary payload
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self, Secret::Binary(_))
    }

    /// The textual payload, if this is a text secret.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Secret::Text(text) => Some(text),
            Secret::Binary(_) => None,
        }
    }

    /// Payload length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.value().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    fn kind(&self) -> &'static str {
        match self {
            Secret::Text(_) => "text",
            Secret::Binary(_) => "binary",
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret::{}([REDACTED; {} bytes])", self.kind(), self.len())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::Text(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Secret {
    fn from(value: Vec<u8>) -> Self {
        Secret::Binary(value)
    }
}

impl From<&[u8]> for Secret {
    fn from(value: &[u8]) -> Self {
        Secret::Binary(value.to_vec())
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_returns_raw_bytes_for_both_variants() {
        assert_eq!(Secret::from("hunter2").value(), b"hunter2");
        assert_eq!(Secret::from(vec![0_u8, 159, 146, 150]).value(), &[0, 159, 146, 150]);
    }

    #[test]
    fn test_variant_queries() {
        let text = Secret::from("abc");
        assert!(!text.is_binary());
        assert_eq!(text.as_text(), Some("abc"));

        let binary = Secret::from(b"abc".as_slice());
        assert!(binary.is_binary());
        assert_eq!(binary.as_text(), None);
        assert_eq!(binary.len(), 3);
    }

    #[test]
    fn test_debug_redacts_payload() {
        let rendered = format!("{:?}", Secret::from("super-secret-password"));
        assert!(!rendered.contains("super-secret-password"));
        assert_eq!(rendered, "Secret::text([REDACTED; 21 bytes])");
    }

    #[test]
    fn test_json_wire_form() {
        let text = serde_json::to_value(Secret::from("pw")).unwrap();
        assert_eq!(text, serde_json::json!({ "text": "pw" }));

        let binary = serde_json::to_value(Secret::from(vec![1_u8, 2, 3])).unwrap();
        assert_eq!(binary, serde_json::json!({ "binary": "AQID" }));

        let parsed: Secret = serde_json::from_str(r#"{"binary":"AQID"}"#).unwrap();
        assert_eq!(parsed, Secret::Binary(vec![1, 2, 3]));
    }

    #[test]
    fn test_json_rejects_invalid_base64() {
        let parsed = serde_json::from_str::<Secret>(r#"{"binary":"not base64!"}"#);
        assert!(parsed.is_err());
    }
}
