use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::roles::RoleClaim;

/// Application-focused representation of a validated token.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: String,
    pub jti: String,
    /// `None` when the token carries no role claim or one this service does
    /// not recognise.
    pub role: Option<RoleClaim>,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub raw: serde_json::Value,
}

impl Claims {
    pub fn has_role(&self, role: RoleClaim) -> bool {
        self.role == Some(role)
    }
}

/// Payload as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClaimsRepr {
    pub iss: String,
    pub aud: AudienceRepr,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    #[serde(
        rename = "LoginCharacter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl AudienceRepr {
    fn into_vec(self) -> Vec<String> {
        match self {
            AudienceRepr::Single(item) => vec![item],
            AudienceRepr::Many(items) => items,
        }
    }
}

fn timestamp(claim: &'static str, value: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(value, 0)
        .single()
        .ok_or_else(|| AuthError::MalformedToken(format!("claim '{claim}' out of range: {value}")))
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let issued_at = timestamp("iat", value.iat)?;
        let not_before = timestamp("nbf", value.nbf)?;
        let expires_at = timestamp("exp", value.exp)?;
        let role = value.role.as_deref().and_then(|raw| raw.parse().ok());

        Ok(Self {
            subject: value.sub,
            jti: value.jti,
            role,
            issued_at,
            not_before,
            expires_at,
            issuer: value.iss,
            audience: value.aud.into_vec(),
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::MalformedToken(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
