//! Bearer token expiry inspection.
//!
//! The client never verifies token signatures; it only reads the payload
//! `exp` claim to decide whether a credential is still worth sending.
//! Anything that cannot be parsed is treated as expired, so a malformed
//! token can never keep a session alive.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

/// Whether the token's `exp` claim is in the past (or unreadable).
pub fn is_expired(token: &str) -> bool {
    match expiration(token) {
        Some(exp) => Utc::now().timestamp() as f64 >= exp,
        None => true,
    }
}

/// Epoch-seconds `exp` claim, or `None` when the token has no readable
/// payload or the claim is missing or non-numeric.
pub fn expiration(token: &str) -> Option<f64> {
    let payload = decode_payload(token)?;
    payload.get("exp")?.as_f64()
}

/// Decode the middle segment of a `header.payload.signature` token as
/// padded base64 JSON. Segments arrive unpadded; pad with `=` until the
/// length is a multiple of 4 before decoding.
fn decode_payload(token: &str) -> Option<serde_json::Value> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let mut payload = segments[1].to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let bytes = STANDARD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Build a syntactically valid token whose payload carries the given
/// `exp` epoch seconds. Only the payload segment is meaningful.
#[cfg(test)]
pub(crate) fn make_token(exp: i64) -> String {
    make_token_with_payload(&serde_json::json!({ "sub": "tester", "exp": exp }))
}

#[cfg(test)]
pub(crate) fn make_token_with_payload(payload: &serde_json::Value) -> String {
    use base64::engine::general_purpose::STANDARD_NO_PAD;

    let header = STANDARD_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = STANDARD_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.signature", header, body)
}
