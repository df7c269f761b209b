use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use labmesh_application::PrivilegeCacheStore;
use labmesh_core::AppResult;
use labmesh_domain::{PrivilegeCacheEntry, RoleCode};
use tokio::sync::RwLock;

/// In-memory privilege cache store for local development and tests.
///
/// Expired entries are returned as stored; the resolution service decides validity.
#[derive(Default)]
pub struct InMemoryPrivilegeCacheStore {
    entries: RwLock<HashMap<RoleCode, PrivilegeCacheEntry>>,
}

impl InMemoryPrivilegeCacheStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrivilegeCacheStore for InMemoryPrivilegeCacheStore {
    async fn get(&self, role: &RoleCode) -> AppResult<Option<PrivilegeCacheEntry>> {
        Ok(self.entries.read().await.get(role).cloned())
    }

    async fn put(&self, role: &RoleCode, privileges: &[String], ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let entry =
            PrivilegeCacheEntry::issue(role.clone(), privileges.to_vec(), Utc::now(), ttl_seconds);
        self.entries.write().await.insert(role.clone(), entry);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use labmesh_application::PrivilegeCacheStore;
    use labmesh_domain::RoleCode;

    use super::InMemoryPrivilegeCacheStore;

    fn role(value: &str) -> RoleCode {
        match RoleCode::new(value) {
            Ok(role) => role,
            Err(error) => panic!("invalid test role: {error}"),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_valid_entry() {
        let store = InMemoryPrivilegeCacheStore::new();
        let admin = role("ADMIN");

        let stored = store
            .put(&admin, &["READ".to_owned(), "WRITE".to_owned()], 60)
            .await;
        assert!(stored.is_ok());

        let entry = store.get(&admin).await;
        let Ok(Some(entry)) = entry else {
            panic!("expected cached entry");
        };
        assert_eq!(entry.privileges(), ["READ".to_owned(), "WRITE".to_owned()]);
        assert!(entry.is_valid_at(Utc::now()));
    }

    #[tokio::test]
    async fn put_replaces_the_previous_entry_without_merging() {
        let store = InMemoryPrivilegeCacheStore::new();
        let admin = role("ADMIN");

        assert!(
            store
                .put(&admin, &["A".to_owned(), "B".to_owned()], 60)
                .await
                .is_ok()
        );
        let Ok(Some(first)) = store.get(&admin).await else {
            panic!("expected first entry");
        };

        assert!(store.put(&admin, &["C".to_owned()], 3600).await.is_ok());
        let Ok(Some(second)) = store.get(&admin).await else {
            panic!("expected replacement entry");
        };

        assert_eq!(second.privileges(), ["C".to_owned()]);
        assert!(second.expire_at() > first.expire_at());
        assert_eq!(second.role(), &admin);
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let store = InMemoryPrivilegeCacheStore::new();
        let admin = role("ADMIN");

        assert!(store.put(&admin, &["READ".to_owned()], 0).await.is_ok());
        assert!(matches!(store.get(&admin).await, Ok(None)));
    }

    #[tokio::test]
    async fn unknown_role_is_a_miss() {
        let store = InMemoryPrivilegeCacheStore::new();
        assert!(matches!(store.get(&role("VIEWER")).await, Ok(None)));
    }
}
