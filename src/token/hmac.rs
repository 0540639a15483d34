use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::{KeyRing, Tokenizer};
use crate::crypto::{SIGNATURE_HEX_LENGTH, sign_hex, verify_hex};
use crate::{Secret, SessionError, SessionValues};

/// Compact HMAC-tagged token.
///
/// Layout: `hex(HMAC-SHA256(entropy, id || payload))`, then the secret ID,
/// then `payload`, where `payload` is the base64url (unpadded) JSON of the
/// value map. The ID doubles as the key selector on decode.
#[derive(Debug, Default)]
pub struct HmacTokenizer {
    keys: KeyRing,
}

impl HmacTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    fn verify(secret: &Secret, token: &str) -> Option<SessionValues> {
        let id = secret.id();
        let signature = token.get(..SIGNATURE_HEX_LENGTH)?;
        let rest = token.get(SIGNATURE_HEX_LENGTH..)?;
        let payload = rest.strip_prefix(id)?;

        if !verify_hex(secret.entropy(), &[id.as_bytes(), payload.as_bytes()], signature) {
            return None;
        }

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

impl Tokenizer for HmacTokenizer {
    fn encode(&self, values: &SessionValues) -> Result<String, SessionError> {
        let secret = self.keys.signing_key()?;
        let json =
            serde_json::to_vec(values).map_err(|e| SessionError::Serialization(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = sign_hex(secret.entropy(), &[secret.id().as_bytes(), payload.as_bytes()]);

        Ok(format!("{signature}{}{payload}", secret.id()))
    }

    fn decode(&self, token: &str) -> Option<SessionValues> {
        let (present, past) = self.keys.verification_keys()?;
        if token.len() < SIGNATURE_HEX_LENGTH + present.id().len() {
            return None;
        }

        Self::verify(&present, token).or_else(|| Self::verify(&past, token))
    }

    fn rotate(&self, present: Arc<Secret>, past: Arc<Secret>) -> Result<(), SessionError> {
        self.keys.install(present, past)
    }
}
