use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::response::Response;
use labmesh_core::AppError;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::GatewayState;

/// Largest request body the gateway buffers before forwarding.
const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP_HEADERS: [header::HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards the request to the upstream owning its path prefix.
pub async fn forward_request(
    State(state): State<GatewayState>,
    request: Request,
) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let route = state
        .route_table
        .route_for(path)
        .ok_or_else(|| AppError::NotFound(format!("no upstream serves '{path}'")))?;

    let target = route.target_url(path, parts.uri.query());

    let body = axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES)
        .await
        .map_err(|error| AppError::Validation(format!("unreadable request body: {error}")))?;

    let mut headers = parts.headers.clone();
    remove_hop_by_hop_headers(&mut headers);
    headers.remove(header::HOST);

    let upstream_response = state
        .http_client
        .request(parts.method.clone(), target)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|error| {
            warn!(prefix = route.prefix(), %error, "upstream request failed");
            if error.is_connect() || error.is_timeout() {
                ApiError::from(AppError::Unavailable(format!(
                    "upstream for '{}' unreachable: {error}",
                    route.prefix()
                )))
            } else {
                ApiError::BadGateway(format!("upstream for '{}' failed: {error}", route.prefix()))
            }
        })?;

    let status = upstream_response.status();
    let mut response_headers = upstream_response.headers().clone();
    remove_hop_by_hop_headers(&mut response_headers);
    response_headers.remove(header::CONTENT_LENGTH);

    let bytes = upstream_response.bytes().await.map_err(|error| {
        ApiError::BadGateway(format!(
            "upstream for '{}' sent an unreadable body: {error}",
            route.prefix()
        ))
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;

    Ok(response)
}

fn remove_hop_by_hop_headers(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
