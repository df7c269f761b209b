use async_trait::async_trait;
use labmesh_core::AppResult;
use labmesh_domain::{PrivilegeCacheEntry, RoleCode};

/// Durable, TTL-indexed store of privilege lists keyed by role.
///
/// Implementations never report a missing or stale entry as an error; the
/// caller checks [`PrivilegeCacheEntry::is_valid_at`] on every read.
#[async_trait]
pub trait PrivilegeCacheStore: Send + Sync {
    /// Returns the stored entry for a role, whether or not it is still valid.
    async fn get(&self, role: &RoleCode) -> AppResult<Option<PrivilegeCacheEntry>>;

    /// Replaces the role's entry with a fresh one expiring after `ttl_seconds`.
    async fn put(&self, role: &RoleCode, privileges: &[String], ttl_seconds: u32) -> AppResult<()>;
}

/// Source of truth for the privileges granted to a role.
#[async_trait]
pub trait PrivilegeDirectory: Send + Sync {
    /// Fetches the privilege codes granted to a role.
    ///
    /// An empty list is a successful answer. Transport failures, non-success
    /// statuses and malformed payloads are errors.
    async fn fetch_privileges(&self, role: &RoleCode) -> AppResult<Vec<String>>;
}
