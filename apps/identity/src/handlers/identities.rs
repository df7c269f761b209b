use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use labmesh_core::AuthorizationContext;
use tracing::info;

use crate::dto::{CurrentIdentityResponse, IdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Internal lookup used by other services' identity resolvers.
pub async fn resolve_identity_handler(
    State(state): State<AppState>,
    Path(external_subject): Path<String>,
) -> ApiResult<Json<IdentityResponse>> {
    let user_id = state
        .identity_directory_service
        .resolve_subject(&external_subject)
        .await?;

    Ok(Json(IdentityResponse {
        external_subject,
        user_id: user_id.to_string(),
    }))
}

/// Links the caller's external subject to an internal user, once.
pub async fn register_identity_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthorizationContext>,
) -> ApiResult<(StatusCode, Json<IdentityResponse>)> {
    let registration = state
        .identity_directory_service
        .register_subject(context.principal())
        .await?;

    let status = if registration.created {
        info!(
            subject = %registration.mapping.external_subject,
            user_id = %registration.mapping.internal_user_id,
            "registered internal identity"
        );
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(IdentityResponse {
            external_subject: registration.mapping.external_subject,
            user_id: registration.mapping.internal_user_id.to_string(),
        }),
    ))
}

pub async fn current_identity_handler(
    Extension(context): Extension<AuthorizationContext>,
) -> Json<CurrentIdentityResponse> {
    Json(CurrentIdentityResponse {
        principal: context.principal().to_owned(),
        roles: context.granted_roles().iter().cloned().collect(),
        privileges: context.granted_privileges().iter().cloned().collect(),
    })
}
