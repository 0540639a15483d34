//! Stateless signed-cookie sessions with scheduled signing-key rotation.
//!
//! Session values travel in a signed cookie; nothing is stored server side.
//! Signing secrets are rotated on a schedule and every token is verified
//! against the present and the past secret, so a rotation never logs anyone
//! out while a leaked key stops being useful after two rotations.
//!
//! # Example
//!
//! ```rust,ignore
//! use latchkey::{Config, SessionError, SessionManager};
//! use latchkey::api::axum::{AppError, SessionHandle, SessionLayer};
//!
//! let manager = SessionManager::new(Config::default())?;
//!
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(SessionLayer::new(manager));
//!
//! async fn handler(session: SessionHandle) -> Result<String, AppError> {
//!     let visits = session.write(|s| {
//!         let visits = s.number::<i64>("visits").unwrap_or(0) + 1;
//!         s.set("visits", visits);
//!         Ok::<_, SessionError>(visits)
//!     })?;
//!     Ok(format!("visits: {visits}"))
//! }
//! ```

use std::fmt;

pub mod api;
pub mod clock;
pub mod config;
pub mod crypto;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod rotation;
pub mod secret;
pub mod session;
pub mod token;
pub mod values;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "mocks"))]
pub use clock::ManualClock;
pub use config::{Config, TokenizerKind};
#[cfg(feature = "jwt")]
pub use jwt::{JwtOptions, JwtTokenizer};
pub use rotation::{
    Rotation, RotationCallback, RotationConfig, RotationHandle, Snapshot, rotation_callback,
};
pub use secret::Secret;
pub use session::{
    CookieCodec, LogFields, MAX_COOKIE_SIZE, RandomSessionFactory, Session, SessionConfig,
    SessionContext, SessionFactory, SessionManager, SessionManagerBuilder, SessionScope,
};
pub use token::{HmacTokenizer, KeyRing, Tokenizer};
pub use values::{Numeric, SessionValues};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Invalid or conflicting construction-time settings.
    Configuration(String),
    /// A session accessor was used on a request the session middleware never saw.
    NoSessionInContext,
    /// The rendered `Set-Cookie` header would exceed [`MAX_COOKIE_SIZE`].
    CookieTooLarge { size: usize },
    /// The tokenizer has not received its first key pair yet.
    NoSigningKey,
    /// JWT tokens carry a mandatory `exp` claim taken from the `expires` field.
    MissingExpiry,
    Serialization(String),
    /// The operating system random source failed.
    Entropy(String),
    /// The rotation callback refused the new key pair.
    Rotation(String),
    Internal(String),
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Configuration(msg) => write!(f, "Invalid session configuration: {msg}"),
            SessionError::NoSessionInContext => {
                write!(f, "No session in request context; is the session middleware installed?")
            }
            SessionError::CookieTooLarge { size } => write!(
                f,
                "Session cookie is {size} bytes, it must not exceed {MAX_COOKIE_SIZE} bytes"
            ),
            SessionError::NoSigningKey => write!(f, "No signing key has been installed yet"),
            SessionError::MissingExpiry => write!(f, "Session values carry no expiry"),
            SessionError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            SessionError::Entropy(msg) => write!(f, "Random source failure: {msg}"),
            SessionError::Rotation(msg) => write!(f, "Key rotation failed: {msg}"),
            SessionError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
