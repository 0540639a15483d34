//! Session cookie rendering and parsing.
//!
//! The token travels as an opaque cookie value. Outgoing cookies are always
//! `SameSite=Strict` and are refused when larger than browsers accept.

use chrono::{DateTime, Utc};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

use super::SessionConfig;
use crate::SessionError;

/// Largest `Set-Cookie` value the codec will emit.
pub const MAX_COOKIE_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieCodec {
    name: String,
    path: String,
    domain: Option<String>,
    secure: bool,
    http_only: bool,
}

impl CookieCodec {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
            http_only: config.cookie_http_only,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the `Set-Cookie` header value carrying `token`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CookieTooLarge` when the rendered header
    /// exceeds [`MAX_COOKIE_SIZE`]. The cookie is never truncated.
    pub fn encode(&self, token: &str, expires: DateTime<Utc>) -> Result<String, SessionError> {
        let expires = OffsetDateTime::from_unix_timestamp(expires.timestamp())
            .map_err(|e| SessionError::Internal(format!("cookie expiry out of range: {e}")))?;

        let mut builder = Cookie::build((self.name.as_str(), token))
            .path(self.path.as_str())
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .http_only(self.http_only)
            .expires(expires);
        if let Some(ref domain) = self.domain {
            builder = builder.domain(domain.as_str());
        }

        let header = builder.build().to_string();
        if header.len() > MAX_COOKIE_SIZE {
            log::warn!(
                target: "latchkey::session",
                "msg=\"session cookie too large\" cookie_name=\"{}\" size=\"{}\"",
                self.name,
                header.len()
            );
            return Err(SessionError::CookieTooLarge { size: header.len() });
        }
        Ok(header)
    }

    /// Finds the session token among raw `Cookie` header values.
    pub fn decode<'a>(&self, headers: impl IntoIterator<Item = &'a str>) -> Option<String> {
        headers
            .into_iter()
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.name)
            .map(|cookie| cookie.value().to_owned())
    }

    /// Reads the session token from request headers.
    pub fn read_cookie(&self, headers: &HeaderMap) -> Option<String> {
        self.decode(
            headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )
    }

    /// Appends an encoded `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` if the header value is not valid.
    pub fn write_cookie(headers: &mut HeaderMap, set_cookie: &str) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(set_cookie)
            .map_err(|e| SessionError::Internal(format!("invalid Set-Cookie header: {e}")))?;
        headers.append(SET_COOKIE, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn codec() -> CookieCodec {
        CookieCodec::new(&SessionConfig::default())
    }

    #[test]
    fn test_encode_renders_strict_cookie() {
        let expires = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let header = codec().encode("token123", expires).unwrap();

        assert!(header.starts_with("latchkey_session=token123"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Expires=Tue, 14 Nov 2023 22:13:20 GMT"));
    }

    #[test]
    fn test_encode_respects_flags_and_domain() {
        let config = SessionConfig {
            cookie_secure: false,
            cookie_http_only: false,
            cookie_domain: Some("example.com".to_owned()),
            ..Default::default()
        };
        let header = CookieCodec::new(&config)
            .encode("t", Utc::now() + Duration::hours(1))
            .unwrap();

        assert!(!header.contains("Secure"));
        assert!(!header.contains("HttpOnly"));
        assert!(header.contains("Domain=example.com"));
    }

    #[test]
    fn test_encode_rejects_oversized_cookie() {
        let token = "x".repeat(MAX_COOKIE_SIZE);
        let result = codec().encode(&token, Utc::now());

        match result {
            Err(SessionError::CookieTooLarge { size }) => assert!(size > MAX_COOKIE_SIZE),
            other => panic!("expected CookieTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_finds_named_cookie() {
        let codec = codec();
        let token = codec.decode(["theme=dark; latchkey_session=abc.def; lang=en"]);
        assert_eq!(token.as_deref(), Some("abc.def"));

        assert!(codec.decode(["theme=dark"]).is_none());
        assert!(codec.decode(std::iter::empty()).is_none());
    }

    #[test]
    fn test_read_and_write_headers() {
        let codec = codec();
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("other=1"));
        headers.append(COOKIE, HeaderValue::from_static("latchkey_session=tok"));
        assert_eq!(codec.read_cookie(&headers).as_deref(), Some("tok"));

        let mut response = HeaderMap::new();
        let set_cookie = codec.encode("tok", Utc::now()).unwrap();
        CookieCodec::write_cookie(&mut response, &set_cookie).unwrap();
        assert_eq!(response.get(SET_COOKIE).unwrap(), set_cookie.as_str());
    }
}
