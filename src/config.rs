//! Configuration types for latchkey.
//!
//! [`Config`] gathers the cookie, rotation and tokenizer settings a
//! [`SessionManager`](crate::SessionManager) is built from. Every setting is
//! validated before anything starts.
//!
//! # Example
//!
//! ```rust
//! use chrono::Duration;
//! use latchkey::{Config, RotationConfig, SessionConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config {
//!     session: SessionConfig {
//!         cookie_name: "sid".to_owned(),
//!         expiry: Duration::hours(8),
//!         ..Default::default()
//!     },
//!     rotation: Some(
//!         RotationConfig::default()
//!             .with_expiry(Duration::hours(8))
//!             .with_window(Duration::hours(1)),
//!     ),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

#[cfg(feature = "jwt")]
use crate::jwt::JwtOptions;
use crate::{RotationConfig, SessionConfig, SessionError};

/// Which token format the manager signs sessions with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Compact HMAC-tagged token.
    #[default]
    Hmac,
    /// HS256 JSON Web Token.
    #[cfg(feature = "jwt")]
    Jwt(JwtOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Cookie and session lifetime settings.
    pub session: SessionConfig,

    /// Secret rotation settings.
    ///
    /// When `None`, secrets expire together with sessions (at least one
    /// second) and every other setting keeps its default.
    pub rotation: Option<RotationConfig>,

    pub tokenizer: TokenizerKind,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for local development over plain HTTP.
    ///
    /// Drops the `Secure` cookie flag and shortens sessions to a day.
    pub fn development() -> Self {
        Self {
            session: SessionConfig {
                cookie_secure: false,
                expiry: Duration::days(1),
                ..Default::default()
            },
            rotation: None,
            tokenizer: TokenizerKind::Hmac,
        }
    }

    /// Short-lived sessions with hourly key rotation and larger secrets.
    pub fn strict() -> Self {
        Self {
            session: SessionConfig {
                expiry: Duration::hours(1),
                ..Default::default()
            },
            rotation: Some(RotationConfig {
                id_size: 8,
                entropy_size: 64,
                expiry: Duration::hours(1),
                window: Some(Duration::minutes(15)),
            }),
            tokenizer: TokenizerKind::Hmac,
        }
    }

    /// The rotation settings in effect.
    pub fn rotation_config(&self) -> RotationConfig {
        self.rotation.clone().unwrap_or_else(|| {
            RotationConfig::default().with_expiry(self.session.expiry.max(Duration::seconds(1)))
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::Configuration` for the first invalid setting.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.session.validate()?;
        self.rotation_config().validate()
    }
}
