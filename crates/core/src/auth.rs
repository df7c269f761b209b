use std::collections::BTreeSet;

use serde::Serialize;

use crate::{AppError, AppResult};

/// Marker prepended to every group when it becomes a granted role.
pub const ROLE_PREFIX: &str = "ROLE_";

const FIELD_DELIMITER: char = '|';
const LIST_DELIMITER: &str = ",";

/// Builds the canonical string the identity signature is computed over.
///
/// `groups` and `privileges` must already be rendered in transport form
/// (comma-joined, in the order the edge produced them).
#[must_use]
pub fn canonical_summary(username: &str, groups: &str, privileges: &str) -> String {
    format!("{username}{FIELD_DELIMITER}{groups}{FIELD_DELIMITER}{privileges}")
}

/// Ordered identity summary stamped onto inbound requests by the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    username: String,
    groups: Vec<String>,
    privileges: Vec<String>,
}

impl IdentitySummary {
    /// Creates a summary, keeping `groups` and `privileges` in the given order.
    #[must_use]
    pub fn new(username: impl Into<String>, groups: Vec<String>, privileges: Vec<String>) -> Self {
        Self {
            username: username.into(),
            groups,
            privileges,
        }
    }

    /// Returns the caller's external subject or login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns group memberships in signing order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns privilege codes in signing order.
    #[must_use]
    pub fn privileges(&self) -> &[String] {
        &self.privileges
    }

    /// Returns the comma-joined groups header value.
    #[must_use]
    pub fn groups_header(&self) -> String {
        self.groups.join(LIST_DELIMITER)
    }

    /// Returns the comma-joined privileges header value.
    #[must_use]
    pub fn privileges_header(&self) -> String {
        self.privileges.join(LIST_DELIMITER)
    }

    /// Returns the canonical signing input for this summary.
    #[must_use]
    pub fn canonical(&self) -> String {
        canonical_summary(
            self.username.as_str(),
            self.groups_header().as_str(),
            self.privileges_header().as_str(),
        )
    }
}

/// The four identity headers exactly as they travel on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHeaders {
    /// Caller identity.
    pub username: String,
    /// Comma-joined groups.
    pub groups: String,
    /// Comma-joined privileges.
    pub privileges: String,
    /// Base64 HMAC-SHA256 over the canonical summary.
    pub signature: String,
}

impl IdentityHeaders {
    /// Header carrying the caller identity.
    pub const USERNAME: &'static str = "x-auth-username";
    /// Header carrying comma-joined groups.
    pub const GROUPS: &'static str = "x-auth-groups";
    /// Header carrying comma-joined privileges.
    pub const PRIVILEGES: &'static str = "x-auth-privileges";
    /// Header carrying the base64 signature.
    pub const SIGNATURE: &'static str = "x-auth-signature";
    /// All identity header names.
    pub const ALL: [&'static str; 4] = [
        Self::USERNAME,
        Self::GROUPS,
        Self::PRIVILEGES,
        Self::SIGNATURE,
    ];

    /// Returns the canonical signing input built from the received values, byte for byte.
    #[must_use]
    pub fn canonical(&self) -> String {
        canonical_summary(
            self.username.as_str(),
            self.groups.as_str(),
            self.privileges.as_str(),
        )
    }

    /// Splits the received values back into an ordered summary.
    #[must_use]
    pub fn to_summary(&self) -> IdentitySummary {
        IdentitySummary::new(
            self.username.clone(),
            split_list(self.groups.as_str()),
            split_list(self.privileges.as_str()),
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split(LIST_DELIMITER).map(str::to_owned).collect()
}

/// Authorization data bound to one verified request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationContext {
    principal: String,
    granted_roles: BTreeSet<String>,
    granted_privileges: BTreeSet<String>,
}

impl AuthorizationContext {
    /// Materializes the context for a verified summary bound to `principal`.
    #[must_use]
    pub fn from_summary(summary: &IdentitySummary, principal: impl Into<String>) -> Self {
        let granted_roles = summary
            .groups()
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| format!("{ROLE_PREFIX}{group}"))
            .collect();
        let granted_privileges = summary
            .privileges()
            .iter()
            .filter(|privilege| !privilege.is_empty())
            .cloned()
            .collect();

        Self {
            principal: principal.into(),
            granted_roles,
            granted_privileges,
        }
    }

    /// Returns the identity bound to the request.
    #[must_use]
    pub fn principal(&self) -> &str {
        self.principal.as_str()
    }

    /// Returns granted roles, each carrying [`ROLE_PREFIX`].
    #[must_use]
    pub fn granted_roles(&self) -> &BTreeSet<String> {
        &self.granted_roles
    }

    /// Returns granted privilege codes.
    #[must_use]
    pub fn granted_privileges(&self) -> &BTreeSet<String> {
        &self.granted_privileges
    }

    /// Returns whether the role is granted. Accepts the code with or without prefix.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        if role.starts_with(ROLE_PREFIX) {
            return self.granted_roles.contains(role);
        }

        self.granted_roles.contains(&format!("{ROLE_PREFIX}{role}"))
    }

    /// Returns whether the privilege is granted.
    #[must_use]
    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.granted_privileges.contains(privilege)
    }

    /// Fails with [`AppError::Forbidden`] unless the privilege is granted.
    pub fn require_privilege(&self, privilege: &str) -> AppResult<()> {
        if self.has_privilege(privilege) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "principal '{}' is missing privilege '{privilege}'",
            self.principal
        )))
    }
}
