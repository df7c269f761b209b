use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use labmesh_application::{RequestAdmission, RequestAuthenticationService};
use labmesh_core::{AppError, IdentityHeaders};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::state::AppState;

/// Verifies the gateway-signed identity headers and attaches the authorization context.
pub async fn authenticate_request(
    State(authentication): State<RequestAuthenticationService>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let path = request.uri().path().to_owned();
    let headers = identity_headers(request.headers());

    match authentication.admit(&path, headers.as_ref()).await {
        Ok(RequestAdmission::Public) => {}
        Ok(RequestAdmission::Authenticated(context)) => {
            debug!(%path, principal = context.principal(), "request authenticated");
            request.extensions_mut().insert(context);
        }
        Err(error) => {
            warn!(%path, %error, "rejected internal request");
            return Err(error.into());
        }
    }

    Ok(next.run(request).await)
}

/// Guards the identity provider hook with the shared bearer secret.
pub async fn require_hook_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if !presented.is_some_and(|token| secrets_match(token, &state.token_hook_secret)) {
        warn!(path = %request.uri().path(), "rejected token hook call");
        return Err(AppError::Unauthorized("invalid token hook credentials".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Reads the four identity headers; any one missing means none were presented.
fn identity_headers(headers: &HeaderMap) -> Option<IdentityHeaders> {
    Some(IdentityHeaders {
        username: header_value(headers, IdentityHeaders::USERNAME)?,
        groups: header_value(headers, IdentityHeaders::GROUPS)?,
        privileges: header_value(headers, IdentityHeaders::PRIVILEGES)?,
        signature: header_value(headers, IdentityHeaders::SIGNATURE)?,
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0_u8, |difference, (left, right)| difference | (left ^ right))
            == 0
}
