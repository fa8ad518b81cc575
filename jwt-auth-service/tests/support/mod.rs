#![allow(dead_code)]

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use common_auth::TokenPolicy;
use http_body_util::BodyExt;
use jwt_auth_service::{build_router, AppState};
use serde_json::Value;
use tower::util::ServiceExt;

pub const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

pub fn test_policy() -> TokenPolicy {
    TokenPolicy::builder("test-issuer", "test-audience", TEST_SECRET.to_vec())
        .with_valid_for_seconds(300)
        .build()
        .expect("test policy")
}

pub fn test_app() -> Result<(Router, AppState)> {
    let state = AppState::new(test_policy())?;
    let router = build_router(state.clone())?;
    Ok((router, state))
}

pub fn login_request(username: &str, password: &str) -> Result<Request<Body>> {
    let body = format!("username={username}&password={password}");
    Ok(Request::builder()
        .method("POST")
        .uri("/api/jwt")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))?)
}

pub fn bearer_request(method: &str, uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

pub async fn send(app: &Router, request: Request<Body>) -> Result<Response<Body>> {
    Ok(app.clone().oneshot(request).await?)
}

pub async fn json_body(response: Response<Body>) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn login(app: &Router, username: &str, password: &str) -> Result<String> {
    let response = send(app, login_request(username, password)?).await?;
    anyhow::ensure!(response.status().is_success(), "login failed: {}", response.status());
    let body = json_body(response).await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("missing access_token"))
}
