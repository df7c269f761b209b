use axum::Json;
use axum::extract::State;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

/// Identity provider pre-token-generation trigger.
///
/// Degraded roles still yield a token; a malformed event is rejected so no
/// token is minted with an unknown claim set.
pub async fn pre_token_generation_handler(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> ApiResult<Json<Value>> {
    let enriched = state
        .token_enrichment_service
        .enrich(event)
        .await
        .inspect_err(|error| warn!(%error, "token enrichment rejected event"))?;

    for (role, reason) in enriched.resolution.degraded_roles() {
        warn!(%role, %reason, "privilege fetch failed; role contributes no privileges");
    }
    for warning in enriched.resolution.cache_warnings() {
        warn!(%warning, "privilege cache unavailable");
    }
    info!(
        roles = enriched.resolution.outcomes().len(),
        privileges = enriched.resolution.privileges().len(),
        complete = enriched.resolution.is_complete(),
        "token privileges resolved"
    );

    Ok(Json(enriched.event))
}
