use chrono::Duration;

use crate::SessionError;

/// Longest session lifetime browsers honor for a cookie.
pub const MAX_SESSION_EXPIRY_DAYS: i64 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    /// How long a fresh session lives. Default: 14 days.
    ///
    /// Session expiry is persisted in whole seconds; the default factory
    /// rounds it up, so anything under a second lives until the next
    /// second boundary.
    pub expiry: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "latchkey_session".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: true,
            expiry: Duration::days(14),
        }
    }
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` describing the first violation.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.cookie_name.is_empty() {
            return Err(SessionError::Configuration(
                "cookie name must not be empty".to_owned(),
            ));
        }
        if !self.cookie_name.bytes().all(is_token_byte) {
            return Err(SessionError::Configuration(format!(
                "cookie name {:?} contains characters not allowed in a cookie name",
                self.cookie_name
            )));
        }
        if !self.cookie_path.starts_with('/') {
            return Err(SessionError::Configuration(
                "cookie path must start with '/'".to_owned(),
            ));
        }
        if self.expiry < Duration::milliseconds(1) {
            return Err(SessionError::Configuration(
                "session expiry cannot be less than a millisecond".to_owned(),
            ));
        }
        if self.expiry > Duration::days(MAX_SESSION_EXPIRY_DAYS) {
            return Err(SessionError::Configuration(format!(
                "session expiry cannot exceed {MAX_SESSION_EXPIRY_DAYS} days"
            )));
        }
        Ok(())
    }
}

/// RFC 6265 cookie-name characters: visible ASCII minus separators.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "latchkey_session");
        assert_eq!(config.cookie_path, "/");
        assert!(config.cookie_secure);
        assert!(config.cookie_http_only);
        assert_eq!(config.expiry, Duration::days(14));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let config = SessionConfig {
            cookie_name: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unsafe_name() {
        for name in ["my session", "a=b", "semi;colon", "caf\u{e9}"] {
            let config = SessionConfig {
                cookie_name: name.to_owned(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_validate_relative_path() {
        let config = SessionConfig {
            cookie_path: "app".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_expiry_bounds() {
        let too_short = SessionConfig {
            expiry: Duration::microseconds(999),
            ..Default::default()
        };
        assert!(too_short.validate().is_err());

        let too_long = SessionConfig {
            expiry: Duration::days(401),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());

        let shortest = SessionConfig {
            expiry: Duration::milliseconds(1),
            ..Default::default()
        };
        assert!(shortest.validate().is_ok());
    }
}
