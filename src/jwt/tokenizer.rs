use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use super::JwtOptions;
use super::claims::{from_claims, to_claims};
use crate::token::KeyRing;
use crate::{Secret, SessionError, SessionValues, Tokenizer};

/// JWT session tokens signed with HS256.
///
/// The header `kid` names the secret that signed the token; decode uses it
/// to pick the present or past key and rejects anything else.
#[derive(Debug, Default)]
pub struct JwtTokenizer {
    options: JwtOptions,
    keys: KeyRing,
}

impl JwtTokenizer {
    pub fn new(options: JwtOptions) -> Self {
        Self {
            options,
            keys: KeyRing::new(),
        }
    }

    pub fn options(&self) -> &JwtOptions {
        &self.options
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;

        if let Some(ref iss) = self.options.issuer {
            validation.set_issuer(&[iss]);
        }

        match self.options.audience {
            Some(ref aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let mut required = vec!["exp"];
        if self.options.issuer.is_some() {
            required.push("iss");
        }
        if self.options.audience.is_some() {
            required.push("aud");
        }
        validation.set_required_spec_claims(&required);

        validation
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

impl Tokenizer for JwtTokenizer {
    fn encode(&self, values: &SessionValues) -> Result<String, SessionError> {
        let secret = self.keys.signing_key()?;
        let claims = to_claims(values, &self.options)?;

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(secret.id().to_owned());

        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(secret.entropy()))
            .map_err(|e| SessionError::Serialization(e.to_string()))
    }

    fn decode(&self, token: &str) -> Option<SessionValues> {
        let header = jsonwebtoken::decode_header(token).ok()?;

        // Checked before key lookup so a public-key algorithm can never be
        // verified with an HMAC secret.
        if !is_hmac(header.alg) {
            log::debug!(
                target: "latchkey::jwt",
                "msg=\"rejected session token\" reason=\"non-HMAC algorithm\" alg=\"{:?}\"",
                header.alg
            );
            return None;
        }

        let secret = self.keys.find(header.kid.as_deref()?)?;
        let key = DecodingKey::from_secret(secret.entropy());

        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &key, &self.validation(header.alg))
                .ok()?;

        from_claims(data.claims)
    }

    fn rotate(&self, present: Arc<Secret>, past: Arc<Secret>) -> Result<(), SessionError> {
        self.keys.install(present, past)
    }
}
