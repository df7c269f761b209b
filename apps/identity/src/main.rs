//! labmesh identity service composition root.

#![forbid(unsafe_code)]

mod api_router;
mod dto;
mod error;
mod handlers;
mod identity_config;
mod middleware;
mod state;

use std::sync::Arc;
use std::time::Duration;

use labmesh_application::{
    IdentityDirectoryService, IdentityMappingRepository, IdentityResolver, PrincipalResolution,
    PrivilegeCacheStore, PrivilegeResolutionService, RequestAuthenticationService,
    TokenEnrichmentService,
};
use labmesh_core::{AppError, IdentitySigner, PublicPathPolicy};
use labmesh_infrastructure::{
    HttpIdentityResolver, HttpPrivilegeDirectory, InMemoryIdentityMappingRepository,
    InMemoryPrivilegeCacheStore, PostgresIdentityMappingRepository, RedisPrivilegeCacheStore,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::identity_config::{IdentityConfig, PrincipalResolutionConfig, init_tracing};
use crate::state::AppState;

const PRIVILEGE_CACHE_KEY_PREFIX: &str = "labmesh:role-privileges";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = IdentityConfig::load()?;

    let postgres_pool = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to connect to database: {error}"))
                })?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

            Some(pool)
        }
        None => None,
    };

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let signer = IdentitySigner::new(config.hmac_secret.as_bytes())?;
    let public_paths = PublicPathPolicy::parse(&config.public_paths);

    let redis_client = config
        .redis_url
        .as_deref()
        .map(|redis_url| {
            redis::Client::open(redis_url)
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))
        })
        .transpose()?;

    let privilege_cache: Arc<dyn PrivilegeCacheStore> = match redis_client.clone() {
        Some(client) => Arc::new(RedisPrivilegeCacheStore::new(
            client,
            PRIVILEGE_CACHE_KEY_PREFIX,
        )),
        None => {
            warn!("REDIS_URL not set; privilege cache is process-local");
            Arc::new(InMemoryPrivilegeCacheStore::new())
        }
    };

    let directory_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.privilege_fetch_timeout_seconds))
        .build()
        .map_err(|error| {
            AppError::Internal(format!("failed to build privilege directory client: {error}"))
        })?;
    let privilege_directory = Arc::new(HttpPrivilegeDirectory::new(
        directory_client,
        config.privilege_fetch_url_template.as_str(),
    )?);

    let token_enrichment_service = TokenEnrichmentService::new(PrivilegeResolutionService::new(
        privilege_cache,
        privilege_directory,
        config.privilege_cache_ttl_seconds,
    ));

    let identity_repository: Arc<dyn IdentityMappingRepository> = match postgres_pool.clone() {
        Some(pool) => Arc::new(PostgresIdentityMappingRepository::new(pool)),
        None => {
            warn!("DATABASE_URL not set; identity mappings are process-local");
            Arc::new(InMemoryIdentityMappingRepository::new())
        }
    };
    let identity_directory_service = IdentityDirectoryService::new(identity_repository);

    let principal_resolution = match &config.principal_resolution {
        PrincipalResolutionConfig::Username => PrincipalResolution::ExternalSubject,
        PrincipalResolutionConfig::Local => {
            let resolver: Arc<dyn IdentityResolver> = Arc::new(identity_directory_service.clone());
            PrincipalResolution::InternalUserId(resolver)
        }
        PrincipalResolutionConfig::Remote {
            identity_service_url,
            timeout_seconds,
        } => {
            let resolver_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(*timeout_seconds))
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build identity client: {error}"))
                })?;
            let resolver: Arc<dyn IdentityResolver> = Arc::new(HttpIdentityResolver::new(
                resolver_client,
                identity_service_url,
                signer.clone(),
                &config.service_name,
            )?);
            PrincipalResolution::InternalUserId(resolver)
        }
    };

    let app_state = AppState {
        token_enrichment_service,
        identity_directory_service,
        subject_authentication: RequestAuthenticationService::new(
            signer.clone(),
            public_paths.clone(),
            PrincipalResolution::ExternalSubject,
        ),
        principal_authentication: RequestAuthenticationService::new(
            signer,
            public_paths,
            principal_resolution,
        ),
        token_hook_secret: Arc::from(config.token_hook_secret.as_str()),
        postgres_pool,
        redis_client,
    };

    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "labmesh-identity listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("identity server error: {error}")))
}
