use std::sync::Arc;

use labmesh_application::{
    IdentityDirectoryService, RequestAuthenticationService, TokenEnrichmentService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub token_enrichment_service: TokenEnrichmentService,
    pub identity_directory_service: IdentityDirectoryService,
    /// Verifies internal callers and keeps the external subject as principal.
    pub subject_authentication: RequestAuthenticationService,
    /// Verifies internal callers and binds the configured principal.
    pub principal_authentication: RequestAuthenticationService,
    pub token_hook_secret: Arc<str>,
    pub postgres_pool: Option<sqlx::PgPool>,
    pub redis_client: Option<redis::Client>,
}
