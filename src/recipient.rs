//! Recipients and delivery records.
//!
//! A recipient is identified by its phone number string; two recipients are
//! the same recipient exactly when their strings are equal.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static RECIPIENT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn recipient_pattern() -> &'static Regex {
    RECIPIENT_PATTERN
        .get_or_init(|| Regex::new(r"^\+?[0-9]{3,15}$").expect("recipient pattern is valid"))
}

/// A registered phone number.
///
/// Deserialization is permissive so files written by earlier versions load
/// unchanged; new registrations go through [`Recipient::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    /// Parses a user-supplied number, trimming surrounding whitespace.
    ///
    /// # Errors
    /// - `MissingField` if the input is blank
    /// - `InvalidRecipient` if it is not an optional `+` followed by 3 to 15 digits
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField {
                field: "numero".to_string(),
            });
        }
        if !recipient_pattern().is_match(trimmed) {
            return Err(ValidationError::InvalidRecipient {
                value: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The number as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short BLAKE3 fingerprint used in logs instead of the number itself.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hash.to_hex()[..12].to_string()
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What caused a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryOrigin {
    /// Sent by the monitor when an availability window opened.
    #[default]
    #[serde(rename = "alerta")]
    Alert,
    /// Sent through the manual test endpoint.
    #[serde(rename = "prueba")]
    Test,
}

/// One successful message delivery.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    #[serde(rename = "numero")]
    pub recipient: Recipient,
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "origen", default)]
    pub origin: DeliveryOrigin,
}

impl DeliveryRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(recipient: Recipient, origin: DeliveryOrigin) -> Self {
        Self {
            recipient,
            timestamp: Utc::now(),
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_accepts_e164_like_numbers() {
        let r = Recipient::parse("  +5493410000000 ").unwrap();
        assert_eq!(r.as_str(), "+5493410000000");

        assert!(Recipient::parse("+111").is_ok());
        assert!(Recipient::parse("5493410000000").is_ok());
    }

    #[test]
    fn parse_rejects_blank_and_malformed_numbers() {
        assert_eq!(
            Recipient::parse("   "),
            Err(ValidationError::MissingField {
                field: "numero".to_string()
            })
        );
        assert!(matches!(
            Recipient::parse("+54 9 341"),
            Err(ValidationError::InvalidRecipient { .. })
        ));
        assert!(matches!(
            Recipient::parse("whatsapp:+5493410000000"),
            Err(ValidationError::InvalidRecipient { .. })
        ));
        assert!(matches!(
            Recipient::parse("+1234567890123456"),
            Err(ValidationError::InvalidRecipient { .. })
        ));
    }

    #[test]
    fn fingerprint_is_stable_and_does_not_leak_the_number() {
        let r = Recipient::parse("+5493410000000").unwrap();
        let fp = r.fingerprint();
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, r.fingerprint());
        assert!(!fp.contains("549341"));
    }

    #[test]
    fn delivery_record_uses_wire_names_and_defaults_origin() {
        let json = r#"{"numero":"+111","fecha":"2024-05-01T12:00:00Z"}"#;
        let record: DeliveryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.recipient.as_str(), "+111");
        assert_eq!(record.origin, DeliveryOrigin::Alert);

        let out = serde_json::to_value(DeliveryRecord::new(
            Recipient::parse("+222").unwrap(),
            DeliveryOrigin::Test,
        ))
        .unwrap();
        assert_eq!(out["numero"], "+222");
        assert_eq!(out["origen"], "prueba");
        assert!(out["fecha"].is_string());
    }
}
