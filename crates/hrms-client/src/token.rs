//! Access token inspection.
//!
//! Only the `exp` claim is read; signatures are the backend's business.
//! Tokens that are not JWTs, or carry no `exp`, are treated as live and left
//! for the backend to reject.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Expiry of a JWT as a UTC timestamp.
#[must_use]
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?;
    #[allow(clippy::cast_possible_truncation)]
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|value| value as i64))?;
    DateTime::from_timestamp(seconds, 0)
}

/// Whether `token` is a JWT whose expiry is at or before `now`.
#[must_use]
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn reads_the_exp_claim() {
        let token = jwt(r#"{"token_type":"access","exp":1700000000,"user_id":4}"#);
        assert_eq!(
            expires_at(&token),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn expiry_is_compared_against_now() {
        let now = Utc::now();
        let past = jwt(&format!(r#"{{"exp":{}}}"#, (now - Duration::minutes(1)).timestamp()));
        let future = jwt(&format!(r#"{{"exp":{}}}"#, (now + Duration::minutes(5)).timestamp()));
        assert!(is_expired(&past, now));
        assert!(!is_expired(&future, now));
    }

    #[test]
    fn opaque_tokens_are_never_expired() {
        let now = Utc::now();
        assert!(!is_expired("opaque-token", now));
        assert!(!is_expired("a.b.c", now));
        assert!(!is_expired(&jwt(r#"{"user_id":4}"#), now));
    }
}
