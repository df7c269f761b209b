use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    // Registration and internal lookups key on the external subject, since the
    // caller may not have an internal id yet.
    let subject_routes = Router::new()
        .route(
            "/internal/identities/{external_subject}",
            get(handlers::identities::resolve_identity_handler),
        )
        .route(
            "/api/identities/me",
            post(handlers::identities::register_identity_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.subject_authentication.clone(),
            middleware::authenticate_request,
        ));

    let principal_routes = Router::new()
        .route(
            "/api/me",
            get(handlers::identities::current_identity_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.principal_authentication.clone(),
            middleware::authenticate_request,
        ));

    let hook_routes = Router::new()
        .route(
            "/hooks/pre-token-generation",
            post(handlers::hooks::pre_token_generation_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_hook_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(subject_routes)
        .merge(principal_routes)
        .merge(hook_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
