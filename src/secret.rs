//! Signing secrets.
//!
//! A [`Secret`] is one generation of key material. It never prints its
//! entropy through `Debug`, so snapshots can be logged safely.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SessionError;
use crate::crypto::{generate_entropy, generate_id};

/// One generation of signing key material.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use latchkey::Secret;
///
/// let secret = Secret::generate(6, 32, Utc::now() + Duration::days(7)).unwrap();
///
/// assert_eq!(secret.id().len(), 6);
/// assert_eq!(secret.entropy().len(), 32);
/// assert!(!format!("{secret:?}").contains(&hex::encode(secret.entropy())));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    id: String,
    #[serde(serialize_with = "entropy_to_hex", deserialize_with = "entropy_from_hex")]
    entropy: Vec<u8>,
    expires: DateTime<Utc>,
}

impl Secret {
    /// Creates a secret from existing material.
    pub fn new(id: impl Into<String>, entropy: Vec<u8>, expires: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            entropy,
            expires,
        }
    }

    /// Generates a fresh secret from the operating system random source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Entropy` if the random source fails.
    pub fn generate(
        id_size: usize,
        entropy_size: usize,
        expires: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            id: generate_id(id_size),
            entropy: generate_entropy(entropy_size)?,
            expires,
        })
    }

    /// Key selector carried in tokens (the JWT `kid`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exposes the key material.
    #[must_use]
    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// Instant after which the secret must not sign new tokens.
    #[must_use]
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("entropy", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

fn entropy_to_hex<S>(entropy: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(entropy))
}

fn entropy_from_hex<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    hex::decode(s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("abc123", vec![0xAB; 32], Utc::now());
        let debug = format!("{secret:?}");
        assert!(debug.contains("abc123"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("abab"));
    }

    #[test]
    fn test_generate_sizes() {
        let secret = Secret::generate(8, 48, Utc::now()).unwrap();
        assert_eq!(secret.id().len(), 8);
        assert_eq!(secret.entropy().len(), 48);
    }

    #[test]
    fn test_generated_secrets_differ() {
        let expires = Utc::now() + Duration::hours(1);
        let a = Secret::generate(6, 32, expires).unwrap();
        let b = Secret::generate(6, 32, expires).unwrap();
        assert_ne!(a.entropy(), b.entropy());
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let secret = Secret::new("abcd", vec![1; 16], now);
        assert!(secret.is_expired(now));
        assert!(!secret.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn test_serialize_roundtrip_hex_entropy() {
        let secret = Secret::new("abcd", vec![0x01, 0xFF], Utc::now());
        let json = serde_json::to_string(&secret).unwrap();
        assert!(json.contains("\"01ff\""));

        let restored: Secret = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, secret);
    }
}
