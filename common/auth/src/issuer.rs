use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tracing::debug;

use crate::claims::{AudienceRepr, ClaimsRepr};
use crate::config::TokenPolicy;
use crate::error::{AuthError, AuthResult};
use crate::roles::RoleClaim;

/// A freshly signed token and the facts it was built from.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub subject: String,
    pub jti: String,
    pub role: RoleClaim,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// Signs HS256 tokens under a shared [`TokenPolicy`].
pub struct TokenIssuer {
    policy: Arc<TokenPolicy>,
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(policy: Arc<TokenPolicy>) -> Self {
        let encoding_key = EncodingKey::from_secret(policy.signing_key().as_bytes());
        Self {
            policy,
            encoding_key,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn issue(&self, subject: &str, role: RoleClaim) -> AuthResult<IssuedToken> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if the current instant were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        role: RoleClaim,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedToken> {
        let valid_for = self.policy.valid_for_seconds();
        let issued_at = now.timestamp();
        let expires_at = issued_at + valid_for;
        let jti = self.policy.next_jti();

        let claims = ClaimsRepr {
            iss: self.policy.issuer().to_string(),
            aud: AudienceRepr::Single(self.policy.audience().to_string()),
            sub: subject.to_string(),
            jti: jti.clone(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
            role: Some(role.as_str().to_string()),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        let issued = to_utc(issued_at)?;
        let expires = to_utc(expires_at)?;
        debug!(%jti, subject, role = %role, "issued token");

        Ok(IssuedToken {
            access_token,
            subject: subject.to_string(),
            jti,
            role,
            issued_at: issued,
            not_before: issued,
            expires_at: expires,
            expires_in: valid_for,
        })
    }
}

fn to_utc(seconds: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| AuthError::Signing(format!("timestamp out of range: {seconds}")))
}
