use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use common_auth::AuthContext;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::credentials::Credential;
use crate::AppState;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: &'static str,
}

#[derive(Debug)]
pub struct LoginError {
    status: StatusCode,
    body: ErrorResponse,
}

impl LoginError {
    fn invalid_credentials() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorResponse {
                code: "INVALID_CREDENTIALS",
                message: "Invalid credentials.",
            },
        }
    }

    fn internal_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                code: "SERVER_ERROR",
                message: "Unable to issue authentication token.",
            },
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Form-encoded login payload. Field names also accept the PascalCase
/// spelling older clients send.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(alias = "UserName", alias = "userName")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, LoginError> {
    let credential = Credential {
        username: form.username,
        password: form.password,
    };

    let Some(role) = state.credentials.verify(&credential).await else {
        state.record_login_metric("invalid_credentials");
        warn!(username = %credential.username, "Rejected login attempt");
        return Err(LoginError::invalid_credentials());
    };

    let issued = state
        .token_issuer
        .issue(&credential.username, role)
        .map_err(|err| {
            state.record_login_metric("error");
            error!(username = %credential.username, error = ?err, "Failed to issue token");
            LoginError::internal_error()
        })?;

    state.record_login_metric("success");
    info!(
        username = %credential.username,
        jti = %issued.jti,
        expires_at = %issued.expires_at,
        "Issued access token"
    );

    Ok(Json(LoginResponse {
        access_token: issued.access_token,
        expires_in: issued.expires_in,
    }))
}

#[derive(Debug, Serialize)]
pub struct MadeIt {
    pub made_it: String,
}

/// Reachable only through the `LoginUser` policy.
pub async fn login_user_greeting(Extension(auth): Extension<AuthContext>) -> Json<MadeIt> {
    info!(subject = %auth.subject(), "Served login-user greeting");
    Json(MadeIt {
        made_it: format!("Welcome To JWT ! you are loginuser:{}", auth.subject()),
    })
}

/// Reachable only through the `GuestUser` policy.
pub async fn guest_greeting(Extension(auth): Extension<AuthContext>) -> Json<MadeIt> {
    info!(subject = %auth.subject(), "Served guest greeting");
    Json(MadeIt {
        made_it: "Welcome To JWT ! You are Guest".to_string(),
    })
}
