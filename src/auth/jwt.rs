use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::repo_types::Role,
    config::{JwtConfig, MAX_TTL_MINUTES},
};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // user ID
    pub role: Role, // account role at issuance
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

/// Who a verified token speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token issuer or audience mismatch")]
    ClaimMismatch,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::ClaimMismatch,
            _ => TokenError::Malformed,
        }
    }
}

/// Signing and verification keys, built once from config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(0, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_at(user_id, role, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user_id: Uuid, role: Role, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = %role, "jwt signed");
        Ok(token)
    }

    /// Pure check of signature, issuer, audience and expiry. Never touches storage.
    pub fn verify(&self, token: &str) -> Result<Session, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
        Ok(Session {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, Role::Farmer).expect("sign");
        let session = keys.verify(&token).expect("verify");
        assert_eq!(
            session,
            Session {
                user_id,
                role: Role::Farmer
            }
        );
    }

    #[test]
    fn token_past_ttl_is_expired() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(10);
        let token = keys
            .issue_at(Uuid::new_v4(), Role::Consumer, issued)
            .expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn rotated_secret_invalidates_tokens() {
        let old = make_keys("old-secret", "iss", "aud");
        let new = make_keys("new-secret", "iss", "aud");
        let token = old.issue(Uuid::new_v4(), Role::Farmer).expect("sign");
        assert_eq!(new.verify(&token).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4(), Role::Consumer).expect("sign");
        let forged = keys.issue(Uuid::new_v4(), Role::Farmer).expect("sign");
        // graft the farmer payload onto the consumer signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert_eq!(keys.verify(&tampered).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.verify("not.a.jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        let token = keys.issue(Uuid::new_v4(), Role::Farmer).expect("sign");
        assert!(keys.verify(&token).is_ok());
        assert_eq!(keys.ttl, Duration::from_secs(MAX_TTL_MINUTES as u64 * 60));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), Role::Farmer).expect("sign");
        assert!(bad.verify(&token).is_err());
    }
}
