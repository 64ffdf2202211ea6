//! Hex envelope for symmetric ciphertexts
//!
//! Wire format: `<nonce_hex>:<salt_hex>:<tag_hex>:<ciphertext_hex>`.
//! Everything needed to decrypt (except the passphrase) travels in the envelope,
//! so no state is kept between an encrypt call and a later decrypt call.

use crate::crypto::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Field delimiter
const DELIMITER: char = ':';

/// Number of fields in an envelope
const FIELD_COUNT: usize = 4;

/// Parameters of one symmetric encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// GCM nonce (unique per encryption)
    pub nonce: [u8; NONCE_SIZE],
    /// PBKDF2 salt (unique per encryption)
    pub salt: [u8; SALT_SIZE],
    /// GCM authentication tag
    pub tag: [u8; TAG_SIZE],
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Parse an envelope from its textual form
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(DELIMITER).collect();
        if parts.len() != FIELD_COUNT {
            return Err(Error::MalformedEnvelope(format!(
                "expected {} fields, got {}",
                FIELD_COUNT,
                parts.len()
            )));
        }

        Ok(Envelope {
            nonce: decode_fixed("nonce", parts[0])?,
            salt: decode_fixed("salt", parts[1])?,
            tag: decode_fixed("tag", parts[2])?,
            ciphertext: decode_field("ciphertext", parts[3])?,
        })
    }

    /// Serialize to the textual form
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            hex::encode(self.nonce),
            hex::encode(self.salt),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext),
            d = DELIMITER
        )
    }
}

impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Envelope::parse(s)
    }
}

fn decode_field(name: &str, field: &str) -> Result<Vec<u8>> {
    hex::decode(field)
        .map_err(|e| Error::MalformedEnvelope(format!("invalid hex in {}: {}", name, e)))
}

fn decode_fixed<const N: usize>(name: &str, field: &str) -> Result<[u8; N]> {
    let bytes = decode_field(name, field)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        Error::MalformedEnvelope(format!(
            "invalid {} length: expected {}, got {}",
            name,
            N,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            nonce: [0x11; NONCE_SIZE],
            salt: [0x22; SALT_SIZE],
            tag: [0x33; TAG_SIZE],
            ciphertext: b"hello world".to_vec(),
        }
    }

    #[test]
    fn test_serialize_layout() {
        let text = sample().serialize();
        let parts: Vec<&str> = text.split(':').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "11".repeat(NONCE_SIZE));
        assert_eq!(parts[1], "22".repeat(SALT_SIZE));
        assert_eq!(parts[2], "33".repeat(TAG_SIZE));
        assert_eq!(parts[3], "68656c6c6f20776f726c64");
    }

    #[test]
    fn test_parse_serialized() {
        let envelope = sample();
        let parsed: Envelope = envelope.serialize().parse().unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_empty_ciphertext() {
        let envelope = Envelope {
            ciphertext: Vec::new(),
            ..sample()
        };
        let text = envelope.serialize();
        assert!(text.ends_with(':'));
        assert_eq!(Envelope::parse(&text).unwrap().ciphertext, Vec::<u8>::new());
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let text = sample().serialize().to_uppercase();
        assert_eq!(Envelope::parse(&text).unwrap(), sample());
    }

    #[test]
    fn test_wrong_field_count() {
        assert!(matches!(
            Envelope::parse("a:b:c"),
            Err(Error::MalformedEnvelope(_))
        ));
        assert!(matches!(
            Envelope::parse(&format!("{}:00", sample().serialize())),
            Err(Error::MalformedEnvelope(_))
        ));
        assert!(matches!(Envelope::parse(""), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn test_invalid_hex() {
        let text = sample().serialize();
        let tampered = text.replacen("11", "zz", 1);
        let err = Envelope::parse(&tampered).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(ref msg) if msg.contains("nonce")));

        let parts: Vec<&str> = text.split(':').collect();
        let bad = format!("not-hex:{}:{}:{}", parts[1], parts[2], parts[3]);
        assert!(matches!(Envelope::parse(&bad), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn test_odd_length_hex() {
        let text = format!("{}0", sample().serialize());
        assert!(matches!(Envelope::parse(&text), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn test_wrong_field_length() {
        let short_salt = format!(
            "{}:{}:{}:{}",
            "11".repeat(NONCE_SIZE),
            "22".repeat(SALT_SIZE - 1),
            "33".repeat(TAG_SIZE),
            "00"
        );
        let err = Envelope::parse(&short_salt).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(ref msg) if msg.contains("salt")));

        let long_tag = format!(
            "{}:{}:{}:{}",
            "11".repeat(NONCE_SIZE),
            "22".repeat(SALT_SIZE),
            "33".repeat(TAG_SIZE + 1),
            "00"
        );
        let err = Envelope::parse(&long_tag).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(ref msg) if msg.contains("tag")));
    }
}
