use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common_auth::{AuthContext, Decision};

use crate::app::AppState;

/// State for one gated route group: the app plus the policy it must satisfy.
#[derive(Clone)]
pub struct PolicyLayerState {
    pub app: AppState,
    pub policy: &'static str,
}

/// Validate the bearer token, consult the named policy, and only then hand
/// the request to the handler with the [`AuthContext`] attached.
pub async fn require_policy(
    State(layer): State<PolicyLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let auth = match AuthContext::from_request_parts(&mut parts, &layer.app).await {
        Ok(auth) => auth,
        Err(err) => {
            layer.app.metrics.token_rejected(err.reason());
            return err.into_response();
        }
    };

    if let Err(err) = layer.app.gate.ensure(&auth, layer.policy) {
        layer
            .app
            .metrics
            .policy_decision(layer.policy, Decision::Deny.as_str());
        return err.into_response();
    }
    layer
        .app
        .metrics
        .policy_decision(layer.policy, Decision::Allow.as_str());

    parts.extensions.insert(auth);
    next.run(Request::from_parts(parts, body)).await
}
