use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{RotationConfig, Snapshot};
use crate::{Clock, Secret, SessionError};

/// Receives every new `(present, past)` pair.
///
/// Returning an error abandons the rotation: the previous pair stays in
/// effect and the scheduler retries later.
pub type RotationCallback =
    Arc<dyn Fn(Arc<Secret>, Arc<Secret>) -> Result<(), SessionError> + Send + Sync>;

/// Attempts at drawing a secret ID that no live generation already uses.
const ID_COLLISION_RETRIES: usize = 8;

/// Owns the future/present/past secret window.
///
/// Construct with [`Rotation::new`] to drive rotations by hand, or with
/// [`Rotation::start`] to also spawn the scheduling loop.
pub struct Rotation {
    config: RotationConfig,
    clock: Arc<dyn Clock>,
    callback: RotationCallback,
    snapshot: Mutex<Snapshot>,
}

impl fmt::Debug for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rotation")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl Rotation {
    /// Validates `config`, generates the first secret and performs the
    /// initial rotation, so `callback` has a key pair before this returns.
    ///
    /// # Errors
    ///
    /// - `SessionError::Configuration` for out-of-bounds settings
    /// - `SessionError::Entropy` if key generation fails
    /// - any error returned by `callback` during the initial rotation
    pub fn new(
        config: RotationConfig,
        clock: Arc<dyn Clock>,
        callback: RotationCallback,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let now = clock.now();
        let first = Arc::new(Secret::generate(
            config.id_size,
            config.entropy_size,
            now + config.expiry,
        )?);

        let rotation = Self {
            config,
            clock,
            callback,
            snapshot: Mutex::new(Snapshot {
                future: Arc::clone(&first),
                present: Arc::clone(&first),
                past: first,
            }),
        };

        rotation.rotate(now).inspect_err(|e| {
            log::error!(target: "latchkey::rotation", "msg=\"initial key rotation failed\" error=\"{e}\"");
        })?;

        Ok(rotation)
    }

    /// Promotes the future secret to present and the present to past.
    ///
    /// A new future secret valid until `now + 2 * expiry` is generated first.
    /// The callback sees the new pair before the snapshot changes; if it
    /// fails, nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the callback's error, `SessionError::Entropy` on key
    /// generation failure, or `SessionError::Internal` on a poisoned lock.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "rotate_secrets", skip_all, err)
    )]
    pub fn rotate(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let mut snapshot = self.lock()?;
        let future = Arc::new(self.next(now + self.config.expiry * 2, &snapshot)?);

        (self.callback)(Arc::clone(&snapshot.future), Arc::clone(&snapshot.present))?;

        let promoted = Arc::clone(&snapshot.future);
        snapshot.past = std::mem::replace(&mut snapshot.present, promoted);
        snapshot.future = future;

        log::debug!(
            target: "latchkey::rotation",
            "msg=\"performed secrets rotation\" present_secret_id=\"{}\" past_secret_id=\"{}\"",
            snapshot.present.id(),
            snapshot.past.id()
        );

        Ok(())
    }

    /// Generates a secret expiring at `expires` whose ID does not collide
    /// with any live generation.
    fn next(&self, expires: DateTime<Utc>, snapshot: &Snapshot) -> Result<Secret, SessionError> {
        for _ in 0..ID_COLLISION_RETRIES {
            let secret = Secret::generate(self.config.id_size, self.config.entropy_size, expires)?;
            if !snapshot.contains_id(secret.id()) {
                return Ok(secret);
            }
            log::warn!(
                target: "latchkey::rotation",
                "msg=\"secret ID collision, regenerating\" secret_id=\"{}\"",
                secret.id()
            );
        }
        Err(SessionError::Entropy(
            "could not generate a unique secret ID".to_owned(),
        ))
    }

    /// Copy of the current secret window.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` on a poisoned lock.
    pub fn snapshot(&self) -> Result<Snapshot, SessionError> {
        Ok(self.lock()?.clone())
    }

    /// When the scheduler should fire next: `present.expires - window`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` on a poisoned lock.
    pub fn next_rotation_at(&self) -> Result<DateTime<Utc>, SessionError> {
        Ok(self.lock()?.present.expires() - self.config.window())
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, SessionError> {
        self.snapshot
            .lock()
            .map_err(|_| SessionError::Internal("secret snapshot lock poisoned".to_owned()))
    }
}
