//! Session tokens signed with the rotating secrets.
//!
//! Every tokenizer signs with the present secret and verifies against both
//! the present and the past one. Verification failures are never errors:
//! a forged, stale or malformed token decodes to `None`, the same as no
//! token at all.

mod hmac;
mod keyring;

use std::sync::Arc;

pub use hmac::HmacTokenizer;
pub use keyring::KeyRing;

use crate::{Secret, SessionError, SessionValues};

pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Signs `values` with the present secret.
    ///
    /// # Errors
    ///
    /// `SessionError::NoSigningKey` before the first rotation, or a
    /// serialization error.
    fn encode(&self, values: &SessionValues) -> Result<String, SessionError>;

    /// Verifies `token` against the present and past secrets.
    fn decode(&self, token: &str) -> Option<SessionValues>;

    /// Installs a new key pair. Called from the rotation callback.
    ///
    /// # Errors
    ///
    /// Refusing the pair abandons the rotation.
    fn rotate(&self, present: Arc<Secret>, past: Arc<Secret>) -> Result<(), SessionError>;
}
