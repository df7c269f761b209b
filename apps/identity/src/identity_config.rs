use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use labmesh_application::DEFAULT_PRIVILEGE_CACHE_TTL_SECONDS;
use labmesh_core::{AppError, EnvReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_PUBLIC_PATHS: &str = "/health,/hooks/**";

/// How `/api` routes bind the request principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalResolutionConfig {
    /// The verified username is the principal.
    Username,
    /// The internal user id from this service's own mapping store.
    Local,
    /// The internal user id from a remote identity service.
    Remote {
        identity_service_url: String,
        timeout_seconds: u64,
    },
}

/// Identity service configuration, read once at startup.
#[derive(Clone)]
pub struct IdentityConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub hmac_secret: String,
    pub public_paths: String,
    pub privilege_fetch_url_template: String,
    pub privilege_cache_ttl_seconds: u32,
    pub privilege_fetch_timeout_seconds: u64,
    pub token_hook_secret: String,
    pub principal_resolution: PrincipalResolutionConfig,
    pub service_name: String,
    pub identity_host: String,
    pub identity_port: u16,
}

impl IdentityConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let env = EnvReader::new(lookup);

        let database_url = env.optional("DATABASE_URL");
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let principal_resolution = match env
            .or_default("PRINCIPAL_RESOLUTION", "username")
            .as_str()
        {
            "username" => PrincipalResolutionConfig::Username,
            "local" => PrincipalResolutionConfig::Local,
            "remote" => PrincipalResolutionConfig::Remote {
                identity_service_url: env.required("IDENTITY_SERVICE_URL")?,
                timeout_seconds: env.parsed_or("IDENTITY_RESOLVE_TIMEOUT_SECONDS", 3)?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "PRINCIPAL_RESOLUTION must be 'username', 'local' or 'remote', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            redis_url: env.optional("REDIS_URL"),
            hmac_secret: env.required("IDENTITY_HMAC_SECRET")?,
            public_paths: env.or_default("PUBLIC_PATHS", DEFAULT_PUBLIC_PATHS),
            privilege_fetch_url_template: env.required("PRIVILEGE_FETCH_URL_TEMPLATE")?,
            privilege_cache_ttl_seconds: env.parsed_or(
                "PRIVILEGE_CACHE_TTL_SECONDS",
                DEFAULT_PRIVILEGE_CACHE_TTL_SECONDS,
            )?,
            privilege_fetch_timeout_seconds: env.parsed_or("PRIVILEGE_FETCH_TIMEOUT_SECONDS", 5)?,
            token_hook_secret: env.required("TOKEN_HOOK_SECRET")?,
            principal_resolution,
            service_name: env.or_default("SERVICE_NAME", "labmesh-identity"),
            identity_host: env.or_default("IDENTITY_HOST", "127.0.0.1"),
            identity_port: env.parsed_or("IDENTITY_PORT", 3002)?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.identity_host).map_err(|error| {
            AppError::Internal(format!(
                "invalid IDENTITY_HOST '{}': {error}",
                self.identity_host
            ))
        })?;
        Ok(SocketAddr::from((host, self.identity_port)))
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
