mod support;

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use common_auth::{RoleClaim, TokenIssuer, TokenPolicy};
use serde_json::Value;
use support::{bearer_request, json_body, login, send, test_app, TEST_SECRET};

async fn metrics_text(app: &axum::Router) -> Result<String> {
    let response = send(app, bearer_request("GET", "/metrics", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await?
        .to_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}

async fn rejection_body(app: &axum::Router, request: Request<Body>) -> Result<Value> {
    let response = send(app, request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    json_body(response).await
}

#[tokio::test]
async fn missing_or_malformed_header_is_unauthorized() -> Result<()> {
    let (app, _) = test_app()?;

    let body = rejection_body(&app, bearer_request("GET", "/api/test", None)?).await?;
    assert_eq!(body["code"], "AUTH_TOKEN");

    let request = Request::builder()
        .method("GET")
        .uri("/api/test")
        .header(header::AUTHORIZATION, "Basic Z3Vlc3Q6Z3Vlc3Q=")
        .body(Body::empty())?;
    let body = rejection_body(&app, request).await?;
    assert_eq!(body["code"], "AUTH_TOKEN");
    Ok(())
}

#[tokio::test]
async fn every_token_failure_looks_the_same() -> Result<()> {
    let (app, state) = test_app()?;
    let valid = login(&app, "guest", "guest").await?;

    let expired = state
        .token_issuer
        .issue_at("guest", RoleClaim::GuestUser, Utc::now() - Duration::minutes(10))?
        .access_token;

    let not_yet_valid = state
        .token_issuer
        .issue_at("guest", RoleClaim::GuestUser, Utc::now() + Duration::minutes(10))?
        .access_token;

    let foreign_issuer = TokenIssuer::new(Arc::new(
        TokenPolicy::builder("someone-else", "test-audience", TEST_SECRET.to_vec()).build()?,
    ))
    .issue("guest", RoleClaim::GuestUser)?
    .access_token;

    let foreign_key = TokenIssuer::new(Arc::new(
        TokenPolicy::builder("test-issuer", "test-audience", b"not-the-secret".to_vec()).build()?,
    ))
    .issue("guest", RoleClaim::GuestUser)?
    .access_token;

    let mut tampered = valid.clone().into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered)?;

    let mut bodies = Vec::new();
    for token in [
        expired,
        not_yet_valid,
        foreign_issuer,
        foreign_key,
        tampered,
        "not-a-token".to_string(),
    ] {
        let body = rejection_body(&app, bearer_request("GET", "/api/test", Some(&token))?).await?;
        bodies.push(body);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));

    let response = send(&app, bearer_request("GET", "/api/test", Some(&valid))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forbidden_response_names_the_policy() -> Result<()> {
    let (app, _) = test_app()?;
    let token = login(&app, "guest", "guest").await?;

    let response = send(&app, bearer_request("POST", "/api/test", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await?;
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(body["message"].as_str().unwrap_or_default().contains("LoginUser"));
    Ok(())
}

#[tokio::test]
async fn rejections_and_decisions_are_counted() -> Result<()> {
    let (app, state) = test_app()?;
    let guest = login(&app, "guest", "guest").await?;
    let expired = state
        .token_issuer
        .issue_at("guest", RoleClaim::GuestUser, Utc::now() - Duration::minutes(10))?
        .access_token;

    send(&app, bearer_request("GET", "/api/test", None)?).await?;
    send(&app, bearer_request("GET", "/api/test", Some(&expired))?).await?;
    send(&app, bearer_request("GET", "/api/test", Some(&guest))?).await?;
    send(&app, bearer_request("POST", "/api/test", Some(&guest))?).await?;

    let text = metrics_text(&app).await?;
    assert!(text.contains("auth_token_rejections_total{reason=\"missing_header\"} 1"));
    assert!(text.contains("auth_token_rejections_total{reason=\"expired\"} 1"));
    assert!(text.contains(
        "auth_policy_decisions_total{decision=\"allow\",policy=\"GuestUser\"} 1"
    ));
    assert!(text.contains(
        "auth_policy_decisions_total{decision=\"deny\",policy=\"LoginUser\"} 1"
    ));
    Ok(())
}
