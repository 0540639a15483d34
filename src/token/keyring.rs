use std::sync::{Arc, Mutex, RwLock};

use crate::{Secret, SessionError};

/// Keys shared by every request a tokenizer serves.
///
/// The write key and the verification pair sit behind independent locks, so
/// verification on the request path never queues behind a signer. A
/// rotation takes both locks and swaps the whole triple at once.
#[derive(Debug, Default)]
pub struct KeyRing {
    signing: Mutex<Option<Arc<Secret>>>,
    verifying: RwLock<Option<(Arc<Secret>, Arc<Secret>)>>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new `(present, past)` pair. `present` becomes the signing key.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` on a poisoned lock.
    pub fn install(&self, present: Arc<Secret>, past: Arc<Secret>) -> Result<(), SessionError> {
        let mut signing = self
            .signing
            .lock()
            .map_err(|_| SessionError::Internal("signing key lock poisoned".to_owned()))?;
        let mut verifying = self
            .verifying
            .write()
            .map_err(|_| SessionError::Internal("verification keys lock poisoned".to_owned()))?;

        *signing = Some(Arc::clone(&present));
        *verifying = Some((present, past));
        Ok(())
    }

    /// The secret new tokens are signed with.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSigningKey` before the first installation.
    pub fn signing_key(&self) -> Result<Arc<Secret>, SessionError> {
        self.signing
            .lock()
            .map_err(|_| SessionError::Internal("signing key lock poisoned".to_owned()))?
            .clone()
            .ok_or(SessionError::NoSigningKey)
    }

    /// The current `(present, past)` pair, if any has been installed.
    pub fn verification_keys(&self) -> Option<(Arc<Secret>, Arc<Secret>)> {
        self.verifying.read().ok()?.clone()
    }

    /// Looks up a verification key by secret ID.
    pub fn find(&self, id: &str) -> Option<Arc<Secret>> {
        let (present, past) = self.verification_keys()?;
        if present.id() == id {
            Some(present)
        } else if past.id() == id {
            Some(past)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn secret(id: &str) -> Arc<Secret> {
        Arc::new(Secret::new(id, vec![7; 32], Utc::now() + Duration::hours(1)))
    }

    #[test]
    fn test_empty_ring_has_no_signing_key() {
        let ring = KeyRing::new();
        assert_eq!(ring.signing_key(), Err(SessionError::NoSigningKey));
        assert!(ring.verification_keys().is_none());
        assert!(ring.find("abcdef").is_none());
    }

    #[test]
    fn test_install_sets_signing_and_verification_keys() {
        let ring = KeyRing::new();
        ring.install(secret("newkey"), secret("oldkey")).unwrap();

        assert_eq!(ring.signing_key().unwrap().id(), "newkey");
        assert_eq!(ring.find("newkey").unwrap().id(), "newkey");
        assert_eq!(ring.find("oldkey").unwrap().id(), "oldkey");
        assert!(ring.find("gone00").is_none());
    }

    #[test]
    fn test_second_install_evicts_oldest() {
        let ring = KeyRing::new();
        ring.install(secret("first1"), secret("first1")).unwrap();
        ring.install(secret("second"), secret("first1")).unwrap();
        ring.install(secret("third3"), secret("second")).unwrap();

        assert!(ring.find("first1").is_none());
        assert!(ring.find("second").is_some());
        assert_eq!(ring.signing_key().unwrap().id(), "third3");
    }

    #[test]
    fn test_readers_always_see_a_consecutive_pair() {
        let ring = KeyRing::new();
        ring.install(secret("key000"), secret("key000")).unwrap();
        let generation = |secret: &Secret| secret.id()[3..].parse::<u32>().unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 1..=500u32 {
                    ring.install(secret(&format!("key{i:03}")), secret(&format!("key{:03}", i - 1)))
                        .unwrap();
                }
            });

            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2000 {
                        let (present, past) = ring.verification_keys().unwrap();
                        let (present, past) = (generation(&present), generation(&past));
                        assert!(present == past + 1 || (present == 0 && past == 0));

                        let signing = generation(&ring.signing_key().unwrap());
                        assert!(signing >= present);
                    }
                });
            }
        });

        assert_eq!(ring.signing_key().unwrap().id(), "key500");
    }
}
