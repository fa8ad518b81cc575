use anyhow::{anyhow, Context, Result};
use common_auth::{TokenPolicy, DEFAULT_VALID_FOR_SECONDS, MAX_VALID_FOR_SECONDS};
use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_ISSUER: &str = "jwt-demo";
const DEFAULT_AUDIENCE: &str = "jwt-demo-clients";
const DEFAULT_PORT: u16 = 5000;

/// Secrets shorter than the HS256 output size are accepted but flagged at startup.
pub const RECOMMENDED_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub issuer: String,
    pub audience: String,
    pub signing_secret: String,
    pub valid_for_seconds: i64,
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn secret_is_short(&self) -> bool {
        self.signing_secret.len() < RECOMMENDED_SECRET_BYTES
    }

    /// Build the process-wide token policy; failure here must stop startup.
    pub fn token_policy(&self) -> Result<TokenPolicy> {
        TokenPolicy::builder(
            self.issuer.clone(),
            self.audience.clone(),
            self.signing_secret.as_bytes().to_vec(),
        )
        .with_valid_for_seconds(self.valid_for_seconds)
        .build()
        .context("Invalid JWT configuration")
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_secret", &"<redacted>")
            .field("valid_for_seconds", &self.valid_for_seconds)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST")
        .ok()
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let host: IpAddr = host
        .parse()
        .with_context(|| format!("Failed to parse HOST '{host}'"))?;

    let port = env::var("PORT")
        .ok()
        .map(|value| {
            value
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Failed to parse PORT '{value}'"))
        })
        .transpose()?
        .unwrap_or(DEFAULT_PORT);

    let issuer = env::var("JWT_ISSUER")
        .ok()
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_ISSUER.to_string());
    let audience = env::var("JWT_AUDIENCE")
        .ok()
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

    let signing_secret = env::var("JWT_SIGNING_SECRET")
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("JWT_SIGNING_SECRET must be set"))?;

    let valid_for_seconds = env::var("JWT_VALID_FOR_SECONDS")
        .ok()
        .map(|value| parse_valid_for(&value))
        .transpose()
        .context("Failed to parse JWT_VALID_FOR_SECONDS")?
        .unwrap_or(DEFAULT_VALID_FOR_SECONDS);

    let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|value| parse_list(&value))
        .unwrap_or_else(default_origins);

    Ok(ServiceConfig {
        host,
        port,
        issuer,
        audience,
        signing_secret,
        valid_for_seconds,
        allowed_origins,
    })
}

fn parse_valid_for(value: &str) -> Result<i64> {
    let seconds = value
        .trim()
        .parse::<i64>()
        .map_err(|err| anyhow!("Invalid duration '{value}': {err}"))?;
    if seconds <= 0 {
        return Err(anyhow!("Token lifetime must be positive, got {seconds}"));
    }
    if seconds > MAX_VALID_FOR_SECONDS {
        return Err(anyhow!(
            "Token lifetime must not exceed {MAX_VALID_FOR_SECONDS} seconds, got {seconds}"
        ));
    }
    Ok(seconds)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
