use std::fmt;

use super::Session;

/// Role reported for sessions that carry none.
pub const GUEST_ROLE: &str = "guest";

/// Request correlation fields for log records.
///
/// Renders as `session_id="..." trace_id="..." user_id="..." ip_address="..." role="..."`
/// so it can be appended to any log message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogFields {
    pub session_id: String,
    pub trace_id: String,
    pub user_id: String,
    pub ip_address: String,
    pub role: String,
}

impl LogFields {
    pub fn from_session(session: &Session<'_>) -> Self {
        let role = match session.role() {
            "" => GUEST_ROLE,
            role => role,
        };

        Self {
            session_id: session.id().to_owned(),
            trace_id: session.trace_id().to_owned(),
            user_id: session.user_id().to_owned(),
            ip_address: session
                .address()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_default(),
            role: role.to_owned(),
        }
    }

    /// Opens a span carrying the correlation fields.
    #[cfg(feature = "tracing")]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            trace_id = %self.trace_id,
            user_id = %self.user_id,
            ip_address = %self.ip_address,
            role = %self.role,
        )
    }
}

impl fmt::Display for LogFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session_id=\"{}\" trace_id=\"{}\" user_id=\"{}\" ip_address=\"{}\" role=\"{}\"",
            self.session_id, self.trace_id, self.user_id, self.ip_address, self.role
        )
    }
}
