use chrono::Duration;

use crate::SessionError;

pub const MIN_ID_SIZE: usize = 4;
pub const MAX_ID_SIZE: usize = 64;
pub const MIN_ENTROPY_SIZE: usize = 16;
pub const MAX_ENTROPY_SIZE: usize = 512;

/// Settings for secret generation and the rotation schedule.
///
/// # Example
///
/// ```rust
/// use chrono::Duration;
/// use latchkey::RotationConfig;
///
/// let config = RotationConfig::default()
///     .with_expiry(Duration::hours(12))
///     .with_window(Duration::hours(2));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Length of generated secret identifiers. Default: 6.
    pub id_size: usize,
    /// Bytes of key material per secret. Default: 32.
    pub entropy_size: usize,
    /// How long a secret signs before the next generation takes over. Default: 7 days.
    pub expiry: Duration,
    /// Safety margin before expiry at which rotation fires. Default: `expiry / 6`.
    pub window: Option<Duration>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            id_size: 6,
            entropy_size: 32,
            expiry: Duration::days(7),
            window: None,
        }
    }
}

impl RotationConfig {
    #[must_use]
    pub fn with_id_size(mut self, id_size: usize) -> Self {
        self.id_size = id_size;
        self
    }

    #[must_use]
    pub fn with_entropy_size(mut self, entropy_size: usize) -> Self {
        self.entropy_size = entropy_size;
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Effective rotation window.
    pub fn window(&self) -> Duration {
        self.window.unwrap_or(self.expiry / 6)
    }

    /// Checks every bound, failing closed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` describing the first violation.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.id_size < MIN_ID_SIZE {
            return Err(SessionError::Configuration(format!(
                "secret ID size must be at least {MIN_ID_SIZE} bytes, got {}",
                self.id_size
            )));
        }
        if self.id_size > MAX_ID_SIZE {
            return Err(SessionError::Configuration(format!(
                "secret ID size must be at most {MAX_ID_SIZE} bytes, got {}",
                self.id_size
            )));
        }
        if self.entropy_size < MIN_ENTROPY_SIZE {
            return Err(SessionError::Configuration(format!(
                "secret entropy size must be at least {MIN_ENTROPY_SIZE} bytes, got {}",
                self.entropy_size
            )));
        }
        if self.entropy_size > MAX_ENTROPY_SIZE {
            return Err(SessionError::Configuration(format!(
                "secret entropy size must be at most {MAX_ENTROPY_SIZE} bytes, got {}",
                self.entropy_size
            )));
        }
        if self.expiry < Duration::seconds(1) {
            return Err(SessionError::Configuration(
                "secret expiry must be at least one second".to_owned(),
            ));
        }

        let window = self.window();
        if window <= Duration::zero() {
            return Err(SessionError::Configuration(
                "rotation window must be positive".to_owned(),
            ));
        }
        if window < self.expiry / 10 {
            return Err(SessionError::Configuration(
                "rotation window is too short for service stability, use at least a tenth of the expiry"
                    .to_owned(),
            ));
        }
        if window >= self.expiry {
            return Err(SessionError::Configuration(
                "rotation window must be shorter than the secret expiry".to_owned(),
            ));
        }
        Ok(())
    }
}
