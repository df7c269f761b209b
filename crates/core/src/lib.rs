//! Shared primitives for all Rust crates in labmesh.

#![forbid(unsafe_code)]

/// Identity summary and per-request authorization context.
pub mod auth;
/// Configuration loading from environment-style lookups.
pub mod env;
/// Public path allow-list shared by the edge and internal services.
pub mod public_paths;
/// Identity summary signing protocol shared by the edge and internal services.
pub mod signing;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{
    AuthorizationContext, IdentityHeaders, IdentitySummary, ROLE_PREFIX, canonical_summary,
};
pub use env::EnvReader;
pub use public_paths::PublicPathPolicy;
pub use signing::IdentitySigner;

/// Result type used across labmesh crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller identity is missing or could not be established.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks a required role or privilege.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A dependency could not be reached or answered unusably.
    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn unavailable_is_distinct_from_not_found() {
        let unavailable = AppError::Unavailable("identity service timed out".to_owned());
        assert!(!matches!(unavailable, AppError::NotFound(_)));
        assert_eq!(
            unavailable.to_string(),
            "dependency unavailable: identity service timed out"
        );
    }
}
