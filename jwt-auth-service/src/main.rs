use anyhow::Context;
use jwt_auth_service::app::{build_router, cors_layer, AppState};
use jwt_auth_service::config::{load_service_config, RECOMMENDED_SECRET_BYTES};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_service_config()?;
    if config.secret_is_short() {
        warn!(
            recommended_bytes = RECOMMENDED_SECRET_BYTES,
            "JWT_SIGNING_SECRET is shorter than recommended for HS256"
        );
    }

    let policy = config.token_policy()?;
    info!(
        issuer = policy.issuer(),
        audience = policy.audience(),
        valid_for_seconds = policy.valid_for_seconds(),
        "Token policy loaded"
    );

    let state = AppState::new(policy)?;
    let app = build_router(state)?.layer(cors_layer(&config.allowed_origins)?);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "starting jwt-auth-service");
    axum::serve(listener, app).await?;

    Ok(())
}
