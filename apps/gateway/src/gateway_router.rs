use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;
use crate::{middleware, proxy};

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(proxy::forward_request)
        .layer(from_fn_with_state(state.clone(), middleware::sign_identity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
