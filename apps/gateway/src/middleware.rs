use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use labmesh_core::{AppError, AppResult, IdentityHeaders};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::request_path;
use crate::state::GatewayState;

/// Signing authority: replaces whatever identity headers the client sent with
/// freshly signed ones derived from the verified access token.
pub async fn sign_identity(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let path = request.uri().path().to_owned();
    strip_identity_headers(request.headers_mut());

    if let Err(error) = request_path::ensure_canonical(&path) {
        warn!(%error, "rejected non-canonical request path");
        return Err(error.into());
    }

    if state.public_paths.is_public(&path) {
        return Ok(next.run(request).await);
    }

    let identity = match authenticate(&state, request.headers()) {
        Ok(identity) => identity,
        Err(error) => {
            warn!(%path, %error, "rejected edge request");
            return Err(error.into());
        }
    };

    debug!(%path, username = %identity.username, "identity headers signed");
    apply_identity_headers(request.headers_mut(), identity)?;

    Ok(next.run(request).await)
}

fn authenticate(state: &GatewayState, headers: &HeaderMap) -> AppResult<IdentityHeaders> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("bearer access token is missing".to_owned()))?;

    let claims = state.access_token_verifier.verify(token)?;
    state.signer.sign(&claims.into_summary())
}

pub(crate) fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in IdentityHeaders::ALL {
        headers.remove(name);
    }
}

fn apply_identity_headers(headers: &mut HeaderMap, identity: IdentityHeaders) -> AppResult<()> {
    let values = [
        (IdentityHeaders::USERNAME, identity.username),
        (IdentityHeaders::GROUPS, identity.groups),
        (IdentityHeaders::PRIVILEGES, identity.privileges),
        (IdentityHeaders::SIGNATURE, identity.signature),
    ];

    for (name, value) in values {
        let value = HeaderValue::try_from(value).map_err(|error| {
            AppError::Unauthorized(format!(
                "identity value for '{name}' is not header-safe: {error}"
            ))
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(())
}
