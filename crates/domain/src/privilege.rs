//! Role codes and cached privilege lists.

use chrono::{DateTime, TimeDelta, Utc};
use labmesh_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated role (group) code as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleCode(String);

impl RoleCode {
    /// Creates a role code, rejecting blank values and the transport delimiters.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "role code must not be empty or whitespace".to_owned(),
            ));
        }

        if value.contains([',', '|']) {
            return Err(AppError::Validation(format!(
                "role code '{value}' must not contain ',' or '|'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the role code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RoleCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Cached privilege list for one role.
///
/// Entries are written whole and never updated in place. Both timestamps
/// have whole-second resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeCacheEntry {
    role: RoleCode,
    privileges: Vec<String>,
    created_at: DateTime<Utc>,
    expire_at: DateTime<Utc>,
}

impl PrivilegeCacheEntry {
    /// Creates an entry written at `now` that expires `ttl_seconds` later.
    #[must_use]
    pub fn issue(
        role: RoleCode,
        privileges: Vec<String>,
        now: DateTime<Utc>,
        ttl_seconds: u32,
    ) -> Self {
        let created_at = truncate_to_seconds(now);
        let expire_at = created_at
            .checked_add_signed(TimeDelta::seconds(i64::from(ttl_seconds)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            role,
            privileges,
            created_at,
            expire_at,
        }
    }

    /// Rebuilds an entry from persisted fields.
    #[must_use]
    pub fn from_parts(
        role: RoleCode,
        privileges: Vec<String>,
        created_at: DateTime<Utc>,
        expire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            role,
            privileges,
            created_at,
            expire_at,
        }
    }

    /// Returns the cached role.
    #[must_use]
    pub fn role(&self) -> &RoleCode {
        &self.role
    }

    /// Returns the cached privilege codes in directory order.
    #[must_use]
    pub fn privileges(&self) -> &[String] {
        &self.privileges
    }

    /// Returns when the entry was written.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the absolute expiry instant.
    #[must_use]
    pub fn expire_at(&self) -> DateTime<Utc> {
        self.expire_at
    }

    /// Returns whether the entry may still be served at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expire_at
    }

    /// Consumes the entry, returning its privilege codes.
    #[must_use]
    pub fn into_privileges(self) -> Vec<String> {
        self.privileges
    }
}

fn truncate_to_seconds(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(value.timestamp(), 0).unwrap_or(value)
}
