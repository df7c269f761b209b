//! Cache-aside privilege resolution for token issuance.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use labmesh_core::AppResult;
use labmesh_domain::RoleCode;

use crate::{PrivilegeCacheStore, PrivilegeDirectory};

/// Default lifetime of a cached privilege list.
pub const DEFAULT_PRIVILEGE_CACHE_TTL_SECONDS: u32 = 60 * 60;

/// How one role's privileges were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePrivilegeOutcome {
    /// Served from a valid cache entry.
    CacheHit(Vec<String>),
    /// Fetched from the directory after a miss or an expired entry.
    Refreshed(Vec<String>),
    /// The directory failed; the role contributes no privileges and nothing was cached.
    Degraded {
        /// Why the directory call failed.
        reason: String,
    },
}

impl RolePrivilegeOutcome {
    fn privileges(&self) -> &[String] {
        match self {
            Self::CacheHit(privileges) | Self::Refreshed(privileges) => privileges,
            Self::Degraded { .. } => &[],
        }
    }
}

/// Result of resolving privileges for a set of roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeResolution {
    privileges: Vec<String>,
    outcomes: Vec<(RoleCode, RolePrivilegeOutcome)>,
    cache_warnings: Vec<String>,
}

impl PrivilegeResolution {
    /// Returns the union of all role privileges, first occurrence order, no duplicates.
    #[must_use]
    pub fn privileges(&self) -> &[String] {
        &self.privileges
    }

    /// Consumes the resolution, returning the merged privileges.
    #[must_use]
    pub fn into_privileges(self) -> Vec<String> {
        self.privileges
    }

    /// Returns per-role outcomes in resolution order.
    #[must_use]
    pub fn outcomes(&self) -> &[(RoleCode, RolePrivilegeOutcome)] {
        &self.outcomes
    }

    /// Returns the roles whose privileges could not be fetched, with the reason.
    pub fn degraded_roles(&self) -> impl Iterator<Item = (&RoleCode, &str)> {
        self.outcomes.iter().filter_map(|(role, outcome)| match outcome {
            RolePrivilegeOutcome::Degraded { reason } => Some((role, reason.as_str())),
            _ => None,
        })
    }

    /// Returns non-fatal cache store failures observed while resolving.
    #[must_use]
    pub fn cache_warnings(&self) -> &[String] {
        &self.cache_warnings
    }

    /// Returns whether every role resolved without degradation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.degraded_roles().next().is_none()
    }

    fn record(
        &mut self,
        role: RoleCode,
        outcome: RolePrivilegeOutcome,
        seen: &mut HashSet<String>,
    ) {
        for privilege in outcome.privileges() {
            if seen.insert(privilege.clone()) {
                self.privileges.push(privilege.clone());
            }
        }
        self.outcomes.push((role, outcome));
    }
}

/// Resolves role privileges through the cache store, falling back to the directory.
#[derive(Clone)]
pub struct PrivilegeResolutionService {
    cache: Arc<dyn PrivilegeCacheStore>,
    directory: Arc<dyn PrivilegeDirectory>,
    ttl_seconds: u32,
}

impl PrivilegeResolutionService {
    /// Creates a resolver caching fetched lists for `ttl_seconds`.
    #[must_use]
    pub fn new(
        cache: Arc<dyn PrivilegeCacheStore>,
        directory: Arc<dyn PrivilegeDirectory>,
        ttl_seconds: u32,
    ) -> Self {
        Self {
            cache,
            directory,
            ttl_seconds,
        }
    }

    /// Resolves the union of privileges granted by `roles`.
    ///
    /// Roles are deduplicated and processed one at a time in the given order.
    /// Directory failures degrade the affected role to no privileges; an
    /// invalid role code fails the whole resolution before any I/O happens.
    pub async fn resolve(&self, roles: &[String]) -> AppResult<PrivilegeResolution> {
        let roles = normalize_roles(roles)?;
        let mut resolution = PrivilegeResolution::default();
        let mut seen = HashSet::new();

        for role in roles {
            let outcome = self.resolve_role(&role, &mut resolution.cache_warnings).await;
            resolution.record(role, outcome, &mut seen);
        }

        Ok(resolution)
    }

    async fn resolve_role(
        &self,
        role: &RoleCode,
        cache_warnings: &mut Vec<String>,
    ) -> RolePrivilegeOutcome {
        match self.cache.get(role).await {
            Ok(Some(entry)) if entry.is_valid_at(Utc::now()) => {
                return RolePrivilegeOutcome::CacheHit(entry.into_privileges());
            }
            Ok(_) => {}
            Err(error) => {
                cache_warnings.push(format!(
                    "failed to read cache entry for role '{role}': {error}"
                ));
            }
        }

        let privileges = match self.directory.fetch_privileges(role).await {
            Ok(privileges) => privileges,
            Err(error) => {
                return RolePrivilegeOutcome::Degraded {
                    reason: error.to_string(),
                };
            }
        };

        if let Err(error) = self.cache.put(role, &privileges, self.ttl_seconds).await {
            cache_warnings.push(format!("failed to write cache entry for role '{role}': {error}"));
        }

        RolePrivilegeOutcome::Refreshed(privileges)
    }
}

fn normalize_roles(roles: &[String]) -> AppResult<Vec<RoleCode>> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(roles.len());

    for role in roles {
        let role = RoleCode::new(role.as_str())?;
        if seen.insert(role.clone()) {
            normalized.push(role);
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests;
