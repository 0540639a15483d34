use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::Sha256;

use crate::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Alphabet for secret and session identifiers: URL and cookie safe.
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Length of a hex-encoded HMAC-SHA256 tag.
pub const SIGNATURE_HEX_LENGTH: usize = 64;

/// Default session identifier length in characters.
pub const DEFAULT_SESSION_ID_LENGTH: usize = 32;

/// Generates a random identifier drawn from [`ID_ALPHABET`].
///
/// With 64 symbols every character carries exactly 6 bits of entropy.
///
/// # Example
///
/// ```rust
/// use latchkey::crypto::generate_id;
///
/// let id = generate_id(6);
/// assert_eq!(id.len(), 6);
/// ```
pub fn generate_id(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..ID_ALPHABET.len());
            char::from(ID_ALPHABET.get(idx).copied().unwrap_or(b'_'))
        })
        .collect()
}

/// Fills `length` bytes from the operating system CSPRNG.
///
/// # Errors
///
/// Returns `SessionError::Entropy` if the random source is unavailable.
pub fn generate_entropy(length: usize) -> Result<Vec<u8>, SessionError> {
    let mut entropy = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(entropy)
}

/// Computes the hex-encoded HMAC-SHA256 of `parts` concatenated, keyed by `key`.
pub fn sign_hex(key: &[u8], parts: &[&[u8]]) -> String {
    hex::encode(mac(key, parts).finalize().into_bytes())
}

/// Verifies a hex-encoded HMAC-SHA256 tag in constant time.
///
/// Malformed hex is treated as a mismatch.
pub fn verify_hex(key: &[u8], parts: &[&[u8]], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    mac(key, parts).verify_slice(&signature).is_ok()
}

fn mac(key: &[u8], parts: &[&[u8]]) -> HmacSha256 {
    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    for part in parts {
        mac.update(part);
    }
    mac
}
