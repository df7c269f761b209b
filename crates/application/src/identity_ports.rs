use async_trait::async_trait;
use labmesh_core::AppResult;
use labmesh_domain::{IdentityMapping, InternalUserId};

/// Repository port for external-subject to internal-user mappings.
#[async_trait]
pub trait IdentityMappingRepository: Send + Sync {
    /// Finds the mapping for an external subject.
    async fn find_by_external_subject(
        &self,
        external_subject: &str,
    ) -> AppResult<Option<IdentityMapping>>;

    /// Stores the mapping unless the subject is already mapped, returning the persisted one.
    async fn insert_if_absent(&self, mapping: IdentityMapping) -> AppResult<IdentityMapping>;
}

/// Resolves an external subject to the internal persistent user id.
///
/// Implementations fail with `AppError::NotFound` when no mapping exists and
/// with `AppError::Unavailable` when the lookup itself could not be
/// performed. They never retry.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves one external subject.
    async fn resolve(&self, external_subject: &str) -> AppResult<InternalUserId>;
}
