//! labmesh edge gateway: authenticates callers, signs their identity, and
//! forwards requests to internal services.

#![forbid(unsafe_code)]

mod error;
mod gateway_config;
mod gateway_router;
mod middleware;
mod primary_auth;
mod proxy;
mod request_path;
mod route_table;
mod state;

use std::sync::Arc;
use std::time::Duration;

use labmesh_core::{AppError, IdentitySigner, PublicPathPolicy};
use tracing::info;

use crate::gateway_config::{GatewayConfig, init_tracing};
use crate::primary_auth::AccessTokenVerifier;
use crate::route_table::RouteTable;
use crate::state::GatewayState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = GatewayConfig::load()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_seconds))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build upstream client: {error}")))?;

    let state = GatewayState {
        signer: IdentitySigner::new(config.hmac_secret.as_bytes())?,
        access_token_verifier: Arc::new(AccessTokenVerifier::new(
            &config.jwt_public_key_pem,
            &config.jwt_issuer,
            config.jwt_audience.as_deref(),
        )?),
        public_paths: PublicPathPolicy::parse(&config.public_paths),
        route_table: Arc::new(RouteTable::parse(&config.routes)?),
        http_client,
    };

    let app = gateway_router::build_router(state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "labmesh-gateway listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("gateway server error: {error}")))
}
