use serde_json::{Map, Value};

use super::JwtOptions;
use crate::{SessionError, SessionValues};

/// Expiration time (unix seconds), mandatory on every session token.
pub const EXP_CLAIM: &str = "exp";
pub const ISS_CLAIM: &str = "iss";
pub const AUD_CLAIM: &str = "aud";
/// Private claim holding the whole session map.
pub const DATA_CLAIM: &str = "data";

/// Builds the claim set: the session map nested under `data`, `exp` taken
/// from `expires`, plus the issuer and audience from `options`.
///
/// Nesting keeps session keys such as `exp` or `iss` out of the registered
/// claim namespace.
pub(crate) fn to_claims(
    values: &SessionValues,
    options: &JwtOptions,
) -> Result<Map<String, Value>, SessionError> {
    let expires = values.expires().ok_or(SessionError::MissingExpiry)?;

    let mut claims = Map::new();
    claims.insert(EXP_CLAIM.to_owned(), expires.timestamp().into());
    if let Some(issuer) = options.issuer() {
        claims.insert(ISS_CLAIM.to_owned(), issuer.into());
    }
    if let Some(audience) = options.audience() {
        claims.insert(AUD_CLAIM.to_owned(), audience.into());
    }
    claims.insert(
        DATA_CLAIM.to_owned(),
        Value::Object(values.clone().into_inner()),
    );
    Ok(claims)
}

/// Extracts the session map from a verified claim set.
///
/// Returns `None` when `data` is missing or not an object.
pub(crate) fn from_claims(mut claims: Map<String, Value>) -> Option<SessionValues> {
    match claims.remove(DATA_CLAIM)? {
        Value::Object(values) => Some(SessionValues::from(values)),
        _ => None,
    }
}
