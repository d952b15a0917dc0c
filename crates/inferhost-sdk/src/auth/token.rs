//! Unverified JWT payload decoding. Signatures are checked by the server;
//! the client only needs a few claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use crate::error::{SdkError, SdkResult};

/// Decode the claims segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> SdkResult<Value> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => return Err(SdkError::Auth("token is not a JWT".into())),
    };
    let raw = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SdkError::Auth(format!("invalid token payload encoding: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| SdkError::Auth(format!("invalid token payload: {e}")))
}

/// The `userId` claim of an access token.
pub fn user_id(token: &str) -> SdkResult<String> {
    decode_claims(token)?
        .get("userId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SdkError::Auth("token has no userId claim".into()))
}

/// True when `exp` lies before `now_secs`. Tokens that cannot be decoded,
/// or carry no `exp`, count as expired.
pub fn is_expired(token: &str, now_secs: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims
            .get("exp")
            .and_then(Value::as_i64)
            .is_none_or(|exp| exp < now_secs),
        Err(e) => {
            tracing::debug!(error=%e, "treating undecodable token as expired");
            true
        }
    }
}

#[cfg(test)]
pub(crate) fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
