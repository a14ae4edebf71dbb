//! Signed bearer tokens for providers that issue `id.secret` credentials.
//!
//! The token is a compact JWT: base64url header and payload, signed with
//! HMAC-SHA256 over `header.payload` using the secret half of the credential.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    sign_type: &'static str,
}

#[derive(Serialize)]
struct TokenPayload<'a> {
    api_key: &'a str,
    exp: i64,
    timestamp: i64,
}

/// Split a credential into `(id, secret)`.
pub fn split_credential(credential: &str) -> Result<(&str, &str)> {
    let mut parts = credential.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(secret), None) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
        _ => Err(Error::Configuration(
            "Invalid API key format: expected '<id>.<secret>'".to_string(),
        )),
    }
}

/// Build a signed token for `credential` valid from `timestamp` (Unix seconds).
///
/// Output is deterministic for a fixed credential and timestamp.
pub fn generate_signed_token(credential: &str, timestamp: i64) -> Result<String> {
    let (id, secret) = split_credential(credential)?;

    let header = TokenHeader {
        alg: "HS256",
        sign_type: "SIGN",
    };
    let payload = TokenPayload {
        api_key: id,
        exp: timestamp + TOKEN_TTL_SECS,
        timestamp,
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| Error::Configuration(e.to_string()))?;
    let payload_json =
        serde_json::to_vec(&payload).map_err(|e| Error::Configuration(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Configuration(format!("Invalid signing secret: {}", e)))?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_segment(segment: &str) -> serde_json::Value {
        let bytes = URL_SAFE_NO_PAD.decode(segment).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_token_is_deterministic() {
        let a = generate_signed_token("abc.def", 1_700_000_000).unwrap();
        let b = generate_signed_token("abc.def", 1_700_000_000).unwrap();
        assert_eq!(a, b);

        let c = generate_signed_token("abc.def", 1_700_000_001).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_token_structure() {
        let token = generate_signed_token("abc.def", 1_700_000_000).unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));

        let header = decode_segment(segments[0]);
        assert_eq!(header, serde_json::json!({"alg": "HS256", "sign_type": "SIGN"}));

        let payload = decode_segment(segments[1]);
        assert_eq!(payload["api_key"], "abc");
        assert_eq!(payload["timestamp"], 1_700_000_000_i64);
        assert_eq!(payload["exp"], 1_700_003_600_i64);
    }

    #[test]
    fn test_compact_header_bytes() {
        let token = generate_signed_token("abc.def", 0).unwrap();
        let header = token.split('.').next().unwrap();
        let raw = URL_SAFE_NO_PAD.decode(header).unwrap();
        assert_eq!(raw, br#"{"alg":"HS256","sign_type":"SIGN"}"#);
    }

    #[test]
    fn test_signature_verifies_with_secret() {
        let token = generate_signed_token("abc.def", 1_700_000_000).unwrap();
        let (signing_input, signature) = token.rsplit_once('.').unwrap();

        let mut mac = HmacSha256::new_from_slice(b"def").unwrap();
        mac.update(signing_input.as_bytes());
        let expected = URL_SAFE_NO_PAD.decode(signature).unwrap();
        assert!(mac.verify_slice(&expected).is_ok());

        let mut wrong = HmacSha256::new_from_slice(b"xyz").unwrap();
        wrong.update(signing_input.as_bytes());
        assert!(wrong.verify_slice(&expected).is_err());
    }

    #[test]
    fn test_malformed_credentials_rejected() {
        for bad in ["nodot", "a.b.c", "", ".secret", "id."] {
            let err = generate_signed_token(bad, 0).unwrap_err();
            assert!(err.is_configuration(), "{bad:?} should be rejected");
        }
    }
}
