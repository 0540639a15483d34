use serde::{Deserialize, Serialize};

use crate::SessionError;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<SessionError> for ErrorResponse {
    fn from(err: SessionError) -> Self {
        let code = match &err {
            SessionError::Configuration(_) => "CONFIGURATION_ERROR",
            SessionError::NoSessionInContext => "NO_SESSION_IN_CONTEXT",
            SessionError::CookieTooLarge { .. } => "COOKIE_TOO_LARGE",
            SessionError::NoSigningKey => "NO_SIGNING_KEY",
            SessionError::MissingExpiry => "MISSING_EXPIRY",
            SessionError::Serialization(_) => "SERIALIZATION_ERROR",
            SessionError::Entropy(_) => "ENTROPY_ERROR",
            SessionError::Rotation(_) => "ROTATION_ERROR",
            SessionError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            error: err.to_string(),
            code: code.to_owned(),
        }
    }
}

/// HTTP status for a session error. Only an oversized session is the
/// client's doing; everything else is a server fault.
pub fn status_code(err: &SessionError) -> u16 {
    match err {
        SessionError::CookieTooLarge { .. } => 413,
        _ => 500,
    }
}

/// Logs server-side failures before they become a 500.
#[cfg_attr(not(any(feature = "axum", feature = "actix")), allow(dead_code))]
pub(crate) fn log_failure(err: &SessionError) {
    if status_code(err) >= 500 {
        log::error!(target: "latchkey::api", "msg=\"session failure\" error=\"{err}\"");
    } else {
        log::warn!(target: "latchkey::api", "msg=\"session rejected\" error=\"{err}\"");
    }
}
