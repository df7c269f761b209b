use std::sync::Arc;

use async_trait::async_trait;
use labmesh_core::{AppError, AppResult, NonEmptyString};
use labmesh_domain::{IdentityMapping, InternalUserId};

use crate::{IdentityMappingRepository, IdentityResolver};

/// Outcome of registering an external subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRegistration {
    /// The stored mapping.
    pub mapping: IdentityMapping,
    /// Whether this call created the mapping.
    pub created: bool,
}

/// Application service owning the external-subject to internal-id mapping.
#[derive(Clone)]
pub struct IdentityDirectoryService {
    repository: Arc<dyn IdentityMappingRepository>,
}

impl IdentityDirectoryService {
    /// Creates a new identity directory service.
    #[must_use]
    pub fn new(repository: Arc<dyn IdentityMappingRepository>) -> Self {
        Self { repository }
    }

    /// Returns the internal id mapped to `external_subject`.
    pub async fn resolve_subject(&self, external_subject: &str) -> AppResult<InternalUserId> {
        let external_subject = NonEmptyString::new(external_subject)?;

        self.repository
            .find_by_external_subject(external_subject.as_str())
            .await?
            .map(|mapping| mapping.internal_user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no internal identity for subject '{}'",
                    external_subject.as_str()
                ))
            })
    }

    /// Maps `external_subject` to a new internal id unless it is mapped already.
    pub async fn register_subject(
        &self,
        external_subject: &str,
    ) -> AppResult<IdentityRegistration> {
        let external_subject = String::from(NonEmptyString::new(external_subject)?);

        if let Some(mapping) = self
            .repository
            .find_by_external_subject(external_subject.as_str())
            .await?
        {
            return Ok(IdentityRegistration {
                mapping,
                created: false,
            });
        }

        let candidate = IdentityMapping {
            external_subject,
            internal_user_id: InternalUserId::new(),
        };
        let mapping = self.repository.insert_if_absent(candidate.clone()).await?;
        let created = mapping == candidate;

        Ok(IdentityRegistration { mapping, created })
    }
}

#[async_trait]
impl IdentityResolver for IdentityDirectoryService {
    async fn resolve(&self, external_subject: &str) -> AppResult<InternalUserId> {
        self.resolve_subject(external_subject).await
    }
}

#[cfg(test)]
mod tests;
