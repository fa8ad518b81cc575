use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct AuthMetrics {
    registry: Registry,
    login_attempts: IntCounterVec,
    token_rejections: IntCounterVec,
    policy_decisions: IntCounterVec,
}

impl AuthMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let login_attempts = IntCounterVec::new(
            Opts::new(
                "auth_login_attempts_total",
                "Count of login attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(login_attempts.clone()))?;

        let token_rejections = IntCounterVec::new(
            Opts::new(
                "auth_token_rejections_total",
                "Count of rejected bearer tokens grouped by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(token_rejections.clone()))?;

        let policy_decisions = IntCounterVec::new(
            Opts::new(
                "auth_policy_decisions_total",
                "Count of authorization decisions per named policy",
            ),
            &["policy", "decision"],
        )?;
        registry.register(Box::new(policy_decisions.clone()))?;

        Ok(Self {
            registry,
            login_attempts,
            token_rejections,
            policy_decisions,
        })
    }

    pub fn login_attempt(&self, outcome: &str) {
        self.login_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn token_rejected(&self, reason: &str) {
        self.token_rejections.with_label_values(&[reason]).inc();
    }

    pub fn policy_decision(&self, policy: &str, decision: &str) {
        self.policy_decisions
            .with_label_values(&[policy, decision])
            .inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
