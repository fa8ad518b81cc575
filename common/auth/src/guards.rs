use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::claims::Claims;
use crate::roles::{RoleClaim, POLICY_GUEST_USER, POLICY_LOGIN_USER};
use crate::AuthContext;

/// A named requirement on exactly one role claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    pub name: String,
    pub required: RoleClaim,
}

impl AuthorizationPolicy {
    pub fn new(name: impl Into<String>, required: RoleClaim) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

/// Allow iff the token's role equals the policy's required role.
pub fn authorize(claims: &Claims, policy: &AuthorizationPolicy) -> Decision {
    if claims.has_role(policy.required) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

#[derive(Debug, Clone)]
pub enum GuardError {
    UnknownPolicy(String),
    Forbidden { policy: String },
}

#[derive(Debug, Serialize)]
struct GuardBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GuardError::UnknownPolicy(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GuardBody {
                    code: "SERVER_ERROR",
                    message: "Authorization policy unavailable.".to_string(),
                },
            ),
            GuardError::Forbidden { policy } => (
                StatusCode::FORBIDDEN,
                GuardBody {
                    code: "FORBIDDEN",
                    message: format!("Access requires policy '{policy}'."),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Lookup table of named policies, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    policies: HashMap<String, AuthorizationPolicy>,
}

impl AuthorizationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two policies served by the demo endpoints.
    pub fn standard() -> Self {
        Self::new()
            .with_policy(AuthorizationPolicy::new(
                POLICY_LOGIN_USER,
                RoleClaim::LoginUser,
            ))
            .with_policy(AuthorizationPolicy::new(
                POLICY_GUEST_USER,
                RoleClaim::GuestUser,
            ))
    }

    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policies.insert(policy.name.clone(), policy);
        self
    }

    pub fn policy(&self, name: &str) -> Option<&AuthorizationPolicy> {
        self.policies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Unknown policy names deny.
    pub fn decide(&self, claims: &Claims, policy_name: &str) -> Decision {
        match self.policy(policy_name) {
            Some(policy) => authorize(claims, policy),
            None => Decision::Deny,
        }
    }

    pub fn ensure(&self, auth: &AuthContext, policy_name: &str) -> Result<(), GuardError> {
        let policy = self.policy(policy_name).ok_or_else(|| {
            warn!(policy = policy_name, "authorization policy not registered");
            GuardError::UnknownPolicy(policy_name.to_string())
        })?;

        match authorize(&auth.claims, policy) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                warn!(
                    policy = policy_name,
                    subject = %auth.claims.subject,
                    role = ?auth.claims.role,
                    "policy_check_failed"
                );
                Err(GuardError::Forbidden {
                    policy: policy_name.to_string(),
                })
            }
        }
    }
}
