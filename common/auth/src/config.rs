use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Default validity window for issued tokens.
pub const DEFAULT_VALID_FOR_SECONDS: i64 = 300;

/// Longest validity window a policy accepts (365 days).
pub const MAX_VALID_FOR_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Source of `jti` values. Implementations must not repeat an id for the
/// lifetime of a signing key.
pub trait JtiGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidJtiGenerator;

impl JtiGenerator for UuidJtiGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Shared HMAC secret. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<{} bytes>)", self.0.len())
    }
}

/// Process-wide token configuration shared by the issuer and the validator.
///
/// Only obtainable through [`TokenPolicyBuilder::build`], so a constructed
/// policy always satisfies its invariants.
#[derive(Clone)]
pub struct TokenPolicy {
    issuer: String,
    audience: String,
    valid_for: Duration,
    signing_key: SigningKey,
    jti_generator: Arc<dyn JtiGenerator>,
}

impl TokenPolicy {
    pub fn builder(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        signing_key: impl Into<Vec<u8>>,
    ) -> TokenPolicyBuilder {
        TokenPolicyBuilder::new(issuer, audience, signing_key)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn valid_for(&self) -> Duration {
        self.valid_for
    }

    /// Validity window in whole seconds, as reported in `expires_in`.
    pub fn valid_for_seconds(&self) -> i64 {
        self.valid_for.num_seconds()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn next_jti(&self) -> String {
        self.jti_generator.next_id()
    }
}

impl fmt::Debug for TokenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPolicy")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("valid_for", &self.valid_for)
            .field("signing_key", &self.signing_key)
            .finish_non_exhaustive()
    }
}

pub struct TokenPolicyBuilder {
    issuer: String,
    audience: String,
    // `None` when the requested window does not fit in a `Duration`.
    valid_for: Option<Duration>,
    signing_key: SigningKey,
    jti_generator: Arc<dyn JtiGenerator>,
}

impl TokenPolicyBuilder {
    fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        signing_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            valid_for: Duration::try_seconds(DEFAULT_VALID_FOR_SECONDS),
            signing_key: SigningKey::new(signing_key),
            jti_generator: Arc::new(UuidJtiGenerator),
        }
    }

    pub fn with_valid_for(mut self, valid_for: Duration) -> Self {
        self.valid_for = Some(valid_for);
        self
    }

    pub fn with_valid_for_seconds(mut self, seconds: i64) -> Self {
        self.valid_for = Duration::try_seconds(seconds);
        self
    }

    pub fn with_jti_generator(mut self, generator: Arc<dyn JtiGenerator>) -> Self {
        self.jti_generator = generator;
        self
    }

    pub fn build(self) -> AuthResult<TokenPolicy> {
        if self.issuer.trim().is_empty() {
            return Err(AuthError::Configuration("issuer must not be empty".into()));
        }
        if self.audience.trim().is_empty() {
            return Err(AuthError::Configuration("audience must not be empty".into()));
        }
        let valid_for = self.valid_for.ok_or_else(|| {
            AuthError::Configuration("valid_for is out of range".into())
        })?;
        // Token timestamps have second precision, so anything shorter would
        // produce a token that is already expired when issued.
        if valid_for.num_seconds() <= 0 {
            return Err(AuthError::Configuration(format!(
                "valid_for must be at least one second, got {valid_for}"
            )));
        }
        if valid_for.num_seconds() > MAX_VALID_FOR_SECONDS {
            return Err(AuthError::Configuration(format!(
                "valid_for must not exceed {MAX_VALID_FOR_SECONDS} seconds, got {}",
                valid_for.num_seconds()
            )));
        }
        if self.signing_key.is_empty() {
            return Err(AuthError::Configuration("signing key must not be empty".into()));
        }

        Ok(TokenPolicy {
            issuer: self.issuer,
            audience: self.audience,
            valid_for,
            signing_key: self.signing_key,
            jti_generator: self.jti_generator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TokenPolicyBuilder {
        TokenPolicy::builder("issuer", "audience", b"0123456789abcdef0123456789abcdef".to_vec())
    }

    #[test]
    fn defaults_to_five_minutes() {
        let policy = builder().build().expect("valid policy");
        assert_eq!(policy.valid_for(), Duration::minutes(5));
        assert_eq!(policy.valid_for_seconds(), 300);
    }

    #[test]
    fn rejects_non_positive_validity() {
        for seconds in [0, -1] {
            let err = builder()
                .with_valid_for_seconds(seconds)
                .build()
                .expect_err("must reject");
            assert!(matches!(err, AuthError::Configuration(_)));
        }

        let err = builder()
            .with_valid_for(Duration::milliseconds(500))
            .build()
            .expect_err("sub-second window rejected");
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn rejects_window_beyond_maximum() {
        let policy = builder()
            .with_valid_for_seconds(MAX_VALID_FOR_SECONDS)
            .build()
            .expect("maximum window accepted");
        assert_eq!(policy.valid_for_seconds(), MAX_VALID_FOR_SECONDS);

        for seconds in [MAX_VALID_FOR_SECONDS + 1, 9_000_000_000_000] {
            let err = builder()
                .with_valid_for_seconds(seconds)
                .build()
                .expect_err("window too long");
            assert!(matches!(err, AuthError::Configuration(_)));
        }

        let err = builder()
            .with_valid_for(Duration::days(10_000))
            .build()
            .expect_err("window too long");
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn unrepresentable_window_is_a_configuration_error() {
        for seconds in [i64::MAX, i64::MIN] {
            let err = builder()
                .with_valid_for_seconds(seconds)
                .build()
                .expect_err("out of range");
            assert!(matches!(err, AuthError::Configuration(_)));
        }
    }

    #[test]
    fn rejects_empty_signing_key() {
        let err = TokenPolicy::builder("issuer", "audience", Vec::new())
            .build()
            .expect_err("must reject");
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn rejects_blank_issuer_and_audience() {
        assert!(TokenPolicy::builder(" ", "aud", b"k".to_vec()).build().is_err());
        assert!(TokenPolicy::builder("iss", "", b"k".to_vec()).build().is_err());
    }

    #[test]
    fn debug_redacts_signing_key() {
        let policy = builder().build().expect("valid policy");
        let rendered = format!("{policy:?}");
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("<32 bytes>"));
    }

    #[test]
    fn uuid_generator_does_not_repeat() {
        let generator = UuidJtiGenerator;
        assert_ne!(generator.next_id(), generator.next_id());
    }
}
