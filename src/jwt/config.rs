/// Optional registered claims stamped on and required of every JWT session.
///
/// Both default to unset. When set, encode adds the claim and decode rejects
/// tokens that do not carry the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtOptions {
    /// Issuer claim (`iss`).
    pub(crate) issuer: Option<String>,
    /// Audience claim (`aud`).
    pub(crate) audience: Option<String>,
}

impl JwtOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuer claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the audience claim.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }
}
