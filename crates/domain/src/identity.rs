//! Internal identities and their link to identity provider subjects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent internal user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalUserId(Uuid);

impl InternalUserId {
    /// Creates a new random internal user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InternalUserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InternalUserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Link between an identity provider subject and an internal user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMapping {
    /// Subject issued by the external identity provider.
    pub external_subject: String,
    /// Internal persistent user identifier.
    pub internal_user_id: InternalUserId,
}
