use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use labmesh_core::{AppError, EnvReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_PUBLIC_PATHS: &str = "/health,/auth/**,/docs/**";

/// Edge gateway configuration, read once at startup.
#[derive(Clone)]
pub struct GatewayConfig {
    pub hmac_secret: String,
    pub public_paths: String,
    pub jwt_public_key_pem: String,
    pub jwt_issuer: String,
    pub jwt_audience: Option<String>,
    pub routes: String,
    pub upstream_timeout_seconds: u64,
    pub gateway_host: String,
    pub gateway_port: u16,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let env = EnvReader::new(lookup);

        Ok(Self {
            hmac_secret: env.required("IDENTITY_HMAC_SECRET")?,
            public_paths: env.or_default("PUBLIC_PATHS", DEFAULT_PUBLIC_PATHS),
            // PEM keys are usually injected on one line with escaped newlines.
            jwt_public_key_pem: env.required("IDP_JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n"),
            jwt_issuer: env.required("IDP_JWT_ISSUER")?,
            jwt_audience: env.optional("IDP_JWT_AUDIENCE"),
            routes: env.required("GATEWAY_ROUTES")?,
            upstream_timeout_seconds: env.parsed_or("UPSTREAM_TIMEOUT_SECONDS", 30)?,
            gateway_host: env.or_default("GATEWAY_HOST", "127.0.0.1"),
            gateway_port: env.parsed_or("GATEWAY_PORT", 8080)?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.gateway_host).map_err(|error| {
            AppError::Internal(format!(
                "invalid GATEWAY_HOST '{}': {error}",
                self.gateway_host
            ))
        })?;
        Ok(SocketAddr::from((host, self.gateway_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
