use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use axum::extract::{FromRef, State};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method, StatusCode,
};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use common_auth::{
    AuthorizationGate, TokenIssuer, TokenPolicy, TokenValidator, POLICY_GUEST_USER,
    POLICY_LOGIN_USER,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

use crate::credentials::{CredentialVerifier, StaticCredentialVerifier};
use crate::handlers::{guest_greeting, issue_token, login_user_greeting};
use crate::metrics::AuthMetrics;
use crate::policy::{require_policy, PolicyLayerState};

#[derive(Clone)]
pub struct AppState {
    pub token_issuer: Arc<TokenIssuer>,
    pub token_validator: Arc<TokenValidator>,
    pub gate: Arc<AuthorizationGate>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub metrics: Arc<AuthMetrics>,
}

impl AppState {
    /// Wire the issuer and validator to one shared policy and the demo
    /// credential table.
    pub fn new(policy: TokenPolicy) -> Result<Self> {
        let policy = Arc::new(policy);
        Ok(Self {
            token_issuer: Arc::new(TokenIssuer::new(policy.clone())),
            token_validator: Arc::new(TokenValidator::new(policy)),
            gate: Arc::new(AuthorizationGate::standard()),
            credentials: Arc::new(StaticCredentialVerifier),
            metrics: Arc::new(AuthMetrics::new()?),
        })
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn record_login_metric(&self, outcome: &str) {
        self.metrics.login_attempt(outcome);
    }
}

impl FromRef<AppState> for Arc<TokenValidator> {
    fn from_ref(state: &AppState) -> Self {
        state.token_validator.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.token_issuer.clone()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            error!(error = ?err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Attach the named-policy middleware to `router`. Fails if the gate does
/// not know `policy`.
fn gated(
    router: Router<AppState>,
    state: &AppState,
    policy: &'static str,
) -> Result<Router<AppState>> {
    if !state.gate.contains(policy) {
        return Err(anyhow!("authorization policy '{policy}' is not registered"));
    }
    let layer_state = PolicyLayerState {
        app: state.clone(),
        policy,
    };
    Ok(router.route_layer(middleware::from_fn_with_state(layer_state, require_policy)))
}

pub fn build_router(state: AppState) -> Result<Router> {
    let login_user_routes = gated(
        Router::new().route("/api/test", post(login_user_greeting)),
        &state,
        POLICY_LOGIN_USER,
    )?;
    let guest_routes = gated(
        Router::new().route("/api/test", get(guest_greeting)),
        &state,
        POLICY_GUEST_USER,
    )?;

    Ok(Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/jwt", post(issue_token))
        .merge(login_user_routes)
        .merge(guest_routes)
        .with_state(state))
}

/// CORS allow-list for the configured origins. Any origin that is not a
/// valid header value, or the `*` wildcard, fails startup.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                bail!("Wildcard CORS origin is not allowed in CORS_ALLOWED_ORIGINS");
            }
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]))
}
