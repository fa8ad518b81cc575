use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::TokenPolicy;
use crate::error::{AuthError, AuthResult};

/// Verifies tokens signed under a shared [`TokenPolicy`].
///
/// The signature check (constant-time MAC comparison) is delegated to
/// `jsonwebtoken`; temporal, issuer and audience checks are done here so they
/// run with zero leeway against an explicit instant.
#[derive(Clone)]
pub struct TokenValidator {
    policy: Arc<TokenPolicy>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(policy: Arc<TokenPolicy>) -> Self {
        let decoding_key = DecodingKey::from_secret(policy.signing_key().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            policy,
            decoding_key,
            validation,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// Validate `token` as if the current instant were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        }

        let token_data = decode::<Value>(token, &self.decoding_key, &self.validation)?;
        let claims = Claims::try_from(token_data.claims)?;

        let now = now.timestamp();
        let not_before = claims.not_before.timestamp();
        let expires_at = claims.expires_at.timestamp();
        if now < not_before {
            return Err(AuthError::TokenNotYetValid { not_before });
        }
        if now >= expires_at {
            return Err(AuthError::TokenExpired { expires_at });
        }

        if claims.issuer != self.policy.issuer() {
            return Err(AuthError::IssuerMismatch(claims.issuer));
        }
        if !claims
            .audience
            .iter()
            .any(|aud| aud == self.policy.audience())
        {
            return Err(AuthError::AudienceMismatch);
        }

        debug!(jti = %claims.jti, subject = %claims.subject, "verified token");
        Ok(claims)
    }
}
