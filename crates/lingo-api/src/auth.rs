//! Bearer-token verification for the gateway.
//!
//! Tokens are minted by the account service with a shared secret:
//! `base64(user_id:expiry_unix:hex(hmac_sha256(secret, user_id:expiry)))`.
//! The gateway only verifies. MAC comparison is constant-time via
//! `Mac::verify_slice`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use lingo_core::defaults::TOKEN_TTL_SECS;
use lingo_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Verifies (and, for the account service and tests, issues) bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| Error::Internal("invalid token secret".into()))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Mint a token for a user, valid for the default TTL from `now`.
    pub fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let expiry = now.timestamp() + TOKEN_TTL_SECS as i64;
        let payload = format!("{user_id}:{expiry}");
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(URL_SAFE_NO_PAD.encode(format!("{payload}:{signature}")))
    }

    /// Verify a token and return the authenticated user id.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid> {
        let decoded = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| Error::Unauthorized("malformed token".into()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| Error::Unauthorized("malformed token".into()))?;

        let mut parts = decoded.splitn(3, ':');
        let (user_part, expiry_part, sig_part) = match (parts.next(), parts.next(), parts.next()) {
            (Some(u), Some(e), Some(s)) => (u, e, s),
            _ => return Err(Error::Unauthorized("malformed token".into())),
        };

        let user_id: Uuid = user_part
            .parse()
            .map_err(|_| Error::Unauthorized("malformed token".into()))?;
        let expiry: i64 = expiry_part
            .parse()
            .map_err(|_| Error::Unauthorized("malformed token".into()))?;
        let signature =
            hex::decode(sig_part).map_err(|_| Error::Unauthorized("malformed token".into()))?;

        let payload = format!("{user_id}:{expiry}");
        self.mac(&payload)?
            .verify_slice(&signature)
            .map_err(|_| Error::Unauthorized("invalid token signature".into()))?;

        let expires_at = Utc
            .timestamp_opt(expiry, 0)
            .single()
            .ok_or_else(|| Error::Unauthorized("malformed token".into()))?;
        if now >= expires_at {
            return Err(Error::Unauthorized("token expired".into()));
        }

        Ok(user_id)
    }
}

/// Extract the bearer token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_issue_then_verify() {
        let signer = TokenSigner::new("test-secret");
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let token = signer.issue(user_id, now).unwrap();
        assert_eq!(signer.verify(&token, now).unwrap(), user_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new("test-secret");
        let user_id = Uuid::new_v4();
        let issued = Utc::now();

        let token = signer.issue(user_id, issued).unwrap();
        let later = issued + Duration::seconds(TOKEN_TTL_SECS as i64 + 1);
        assert!(matches!(
            signer.verify(&token, later),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = TokenSigner::new("test-secret");
        let other = TokenSigner::new("other-secret");
        let token = signer.issue(Uuid::new_v4(), Utc::now()).unwrap();
        assert!(other.verify(&token, Utc::now()).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let signer = TokenSigner::new("test-secret");
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let token = signer.issue(user_id, now).unwrap();

        // Swap the user id inside the payload.
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
        let tampered_payload = decoded.replacen(&user_id.to_string(), &Uuid::nil().to_string(), 1);
        let tampered = URL_SAFE_NO_PAD.encode(tampered_payload);
        assert!(signer.verify(&tampered, now).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = TokenSigner::new("test-secret");
        assert!(signer.verify("not-a-token", Utc::now()).is_err());
        assert!(signer.verify("", Utc::now()).is_err());
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
