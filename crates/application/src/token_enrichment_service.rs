//! Pre-token-generation hook: embeds resolved privileges into the access token.

use labmesh_core::{AppError, AppResult};
use serde_json::{Map, Value};

use crate::{PrivilegeResolution, PrivilegeResolutionService};

/// Claim the resolved privilege list is written under.
pub const PRIVILEGES_CLAIM: &str = "privileges";

const CLAIMS_PATH: [&str; 4] = [
    "response",
    "claimsAndScopeOverrideDetails",
    "accessTokenGeneration",
    "claimsToAddOrOverride",
];

/// Identity provider event after privilege enrichment.
#[derive(Debug, Clone)]
pub struct EnrichedTokenEvent {
    /// The event to hand back to the identity provider.
    pub event: Value,
    /// How the embedded privileges were resolved.
    pub resolution: PrivilegeResolution,
}

/// Application service behind the identity provider's pre-token-generation trigger.
#[derive(Clone)]
pub struct TokenEnrichmentService {
    privilege_resolution_service: PrivilegeResolutionService,
}

impl TokenEnrichmentService {
    /// Creates the service.
    #[must_use]
    pub fn new(privilege_resolution_service: PrivilegeResolutionService) -> Self {
        Self {
            privilege_resolution_service,
        }
    }

    /// Resolves privileges for the event's groups and writes them into the token claims.
    ///
    /// A structurally malformed event fails the whole call so the identity
    /// provider refuses to mint a token with an incomplete claim set.
    pub async fn enrich(&self, mut event: Value) -> AppResult<EnrichedTokenEvent> {
        let groups = groups_to_override(&event)?;
        let resolution = self.privilege_resolution_service.resolve(&groups).await?;

        let claims = claims_to_add_or_override(&mut event)?;
        claims.insert(
            PRIVILEGES_CLAIM.to_owned(),
            Value::Array(
                resolution
                    .privileges()
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );

        Ok(EnrichedTokenEvent { event, resolution })
    }
}

fn groups_to_override(event: &Value) -> AppResult<Vec<String>> {
    let groups = event
        .get("request")
        .and_then(|request| request.get("groupConfiguration"))
        .and_then(|configuration| configuration.get("groupsToOverride"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AppError::Validation(
                "token event requires array 'request.groupConfiguration.groupsToOverride'"
                    .to_owned(),
            )
        })?;

    groups
        .iter()
        .map(|group| {
            group.as_str().map(str::to_owned).ok_or_else(|| {
                AppError::Validation(format!(
                    "token event group entries must be strings, got '{group}'"
                ))
            })
        })
        .collect()
}

fn claims_to_add_or_override(event: &mut Value) -> AppResult<&mut Map<String, Value>> {
    let mut current = event
        .as_object_mut()
        .ok_or_else(|| AppError::Validation("token event must be a JSON object".to_owned()))?;

    for key in CLAIMS_PATH {
        current = child_object(current, key)?;
    }

    Ok(current)
}

fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> AppResult<&'a mut Map<String, Value>> {
    let slot = parent.entry(key.to_owned()).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }

    slot.as_object_mut().ok_or_else(|| {
        AppError::Validation(format!("token event field '{key}' must be an object"))
    })
}
