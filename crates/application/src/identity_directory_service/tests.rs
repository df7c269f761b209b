use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use labmesh_core::{AppError, AppResult};
use labmesh_domain::{IdentityMapping, InternalUserId};
use tokio::sync::Mutex;

use crate::{IdentityMappingRepository, IdentityResolver};

use super::IdentityDirectoryService;

#[derive(Default)]
struct FakeIdentityMappingRepository {
    mappings: Mutex<HashMap<String, InternalUserId>>,
}

#[async_trait]
impl IdentityMappingRepository for FakeIdentityMappingRepository {
    async fn find_by_external_subject(
        &self,
        external_subject: &str,
    ) -> AppResult<Option<IdentityMapping>> {
        Ok(self
            .mappings
            .lock()
            .await
            .get(external_subject)
            .map(|internal_user_id| IdentityMapping {
                external_subject: external_subject.to_owned(),
                internal_user_id: *internal_user_id,
            }))
    }

    async fn insert_if_absent(&self, mapping: IdentityMapping) -> AppResult<IdentityMapping> {
        let mut mappings = self.mappings.lock().await;
        let internal_user_id = *mappings
            .entry(mapping.external_subject.clone())
            .or_insert(mapping.internal_user_id);

        Ok(IdentityMapping {
            external_subject: mapping.external_subject,
            internal_user_id,
        })
    }
}

#[tokio::test]
async fn resolve_unmapped_subject_returns_not_found() {
    let service = IdentityDirectoryService::new(Arc::new(FakeIdentityMappingRepository::default()));

    let result = service.resolve("unknown-subject").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn resolve_mapped_subject_is_stable_across_calls() {
    let internal_user_id = InternalUserId::new();
    let repository = FakeIdentityMappingRepository::default();
    repository
        .mappings
        .lock()
        .await
        .insert("alice-sub".to_owned(), internal_user_id);
    let service = IdentityDirectoryService::new(Arc::new(repository));

    for _ in 0..3 {
        let result = service.resolve("alice-sub").await;
        assert!(matches!(result, Ok(value) if value == internal_user_id));
    }
}

#[tokio::test]
async fn resolve_rejects_blank_subject() {
    let service = IdentityDirectoryService::new(Arc::new(FakeIdentityMappingRepository::default()));

    let result = service.resolve("   ").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn register_subject_is_idempotent() {
    let service = IdentityDirectoryService::new(Arc::new(FakeIdentityMappingRepository::default()));

    let Ok(first) = service.register_subject("bob-sub").await else {
        panic!("first registration failed");
    };
    let Ok(second) = service.register_subject("bob-sub").await else {
        panic!("second registration failed");
    };

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.mapping, second.mapping);

    let resolved = service.resolve("bob-sub").await;
    assert!(matches!(resolved, Ok(value) if value == first.mapping.internal_user_id));
}
