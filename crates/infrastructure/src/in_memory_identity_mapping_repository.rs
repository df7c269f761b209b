use std::collections::HashMap;

use async_trait::async_trait;
use labmesh_application::IdentityMappingRepository;
use labmesh_core::AppResult;
use labmesh_domain::{IdentityMapping, InternalUserId};
use tokio::sync::RwLock;

/// In-memory identity mapping repository for local development and tests.
#[derive(Default)]
pub struct InMemoryIdentityMappingRepository {
    mappings: RwLock<HashMap<String, InternalUserId>>,
}

impl InMemoryIdentityMappingRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityMappingRepository for InMemoryIdentityMappingRepository {
    async fn find_by_external_subject(
        &self,
        external_subject: &str,
    ) -> AppResult<Option<IdentityMapping>> {
        Ok(self
            .mappings
            .read()
            .await
            .get(external_subject)
            .map(|internal_user_id| IdentityMapping {
                external_subject: external_subject.to_owned(),
                internal_user_id: *internal_user_id,
            }))
    }

    async fn insert_if_absent(&self, mapping: IdentityMapping) -> AppResult<IdentityMapping> {
        let mut mappings = self.mappings.write().await;
        let internal_user_id = *mappings
            .entry(mapping.external_subject.clone())
            .or_insert(mapping.internal_user_id);

        Ok(IdentityMapping {
            external_subject: mapping.external_subject,
            internal_user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use labmesh_application::IdentityMappingRepository;
    use labmesh_domain::{IdentityMapping, InternalUserId};

    use super::InMemoryIdentityMappingRepository;

    #[tokio::test]
    async fn first_insert_wins() {
        let repository = InMemoryIdentityMappingRepository::new();
        let first = InternalUserId::new();

        let stored = repository
            .insert_if_absent(IdentityMapping {
                external_subject: "sub-1".to_owned(),
                internal_user_id: first,
            })
            .await;
        assert!(matches!(stored, Ok(ref mapping) if mapping.internal_user_id == first));

        let second = repository
            .insert_if_absent(IdentityMapping {
                external_subject: "sub-1".to_owned(),
                internal_user_id: InternalUserId::new(),
            })
            .await;
        assert!(matches!(second, Ok(ref mapping) if mapping.internal_user_id == first));

        let found = repository.find_by_external_subject("sub-1").await;
        assert!(matches!(found, Ok(Some(ref mapping)) if mapping.internal_user_id == first));
    }

    #[tokio::test]
    async fn unknown_subject_is_absent() {
        let repository = InMemoryIdentityMappingRepository::new();
        assert!(matches!(
            repository.find_by_external_subject("nobody").await,
            Ok(None)
        ));
    }
}
