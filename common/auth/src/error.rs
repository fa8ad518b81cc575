use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::errors::ErrorKind;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token policy: {0}")]
    Configuration(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token not valid before {not_before}")]
    TokenNotYetValid { not_before: i64 },
    #[error("token expired at {expires_at}")]
    TokenExpired { expires_at: i64 },
    #[error("token issuer '{0}' not accepted")]
    IssuerMismatch(String),
    #[error("token audience not accepted")]
    AudienceMismatch,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Short label used for logs and metrics; never sent to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "configuration",
            AuthError::MissingAuthorization => "missing_header",
            AuthError::InvalidAuthorization => "malformed_header",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenNotYetValid { .. } => "not_yet_valid",
            AuthError::TokenExpired { .. } => "expired",
            AuthError::IssuerMismatch(_) => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::Signing(_) => "signing",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::MalformedToken(value.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Token failures share one body regardless of which check failed.
        let (status, body) = match &self {
            AuthError::Configuration(_) | AuthError::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "SERVER_ERROR",
                    message: "Unable to process authentication.",
                },
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "AUTH_TOKEN",
                    message: "Authentication required.",
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
