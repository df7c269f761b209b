use std::sync::Arc;

use labmesh_core::{IdentitySigner, PublicPathPolicy};

use crate::primary_auth::AccessTokenVerifier;
use crate::route_table::RouteTable;

/// Shared gateway state.
#[derive(Clone)]
pub struct GatewayState {
    pub signer: IdentitySigner,
    pub access_token_verifier: Arc<AccessTokenVerifier>,
    pub public_paths: PublicPathPolicy,
    pub route_table: Arc<RouteTable>,
    pub http_client: reqwest::Client,
}
