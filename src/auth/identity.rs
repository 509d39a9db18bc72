//! Caller identity from a bearer token
//!
//! The token has already been validated by whatever fronts this process; this
//! only reads its claims for log correlation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;
use crate::Result;
use crate::error::Error;

/// Claims tried, in order, to name the caller
const USER_CLAIMS: &[&str] = &["sub", "username", "client_id"];

/// Extract the user id from a JWT, with or without the `Bearer ` prefix.
pub fn user_id_from_token(token: &str) -> Result<String> {
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::Auth("Token is not a JWT".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::Auth(format!("Invalid token payload encoding: {}", e)))?;

    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Auth(format!("Invalid token claims: {}", e)))?;

    USER_CLAIMS
        .iter()
        .find_map(|claim| claims.get(*claim)?.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| Error::Auth("Token has no user claim".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_sub_claim() {
        let token = jwt(json!({"sub": "user-123", "username": "alice"}));
        assert_eq!(user_id_from_token(&token).unwrap(), "user-123");
    }

    #[test]
    fn test_bearer_prefix_and_fallback_claim() {
        let token = format!("Bearer {}", jwt(json!({"client_id": "svc-9"})));
        assert_eq!(user_id_from_token(&token).unwrap(), "svc-9");
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(matches!(user_id_from_token("opaque"), Err(Error::Auth(_))));
        assert!(matches!(user_id_from_token("a.!!!.c"), Err(Error::Auth(_))));
        let no_user = jwt(json!({"exp": 1}));
        assert!(matches!(user_id_from_token(&no_user), Err(Error::Auth(_))));
    }
}
