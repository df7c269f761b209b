use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use labmesh_core::{AppError, AppResult};
use labmesh_domain::{PrivilegeCacheEntry, RoleCode};
use tokio::sync::Mutex;

use crate::{PrivilegeCacheStore, PrivilegeDirectory};

use super::{PrivilegeResolutionService, RolePrivilegeOutcome};

const TTL_SECONDS: u32 = 3600;

#[derive(Default)]
struct FakePrivilegeCacheStore {
    entries: Mutex<HashMap<RoleCode, PrivilegeCacheEntry>>,
    reads: Mutex<u32>,
    writes: Mutex<u32>,
    fail_reads: bool,
}

impl FakePrivilegeCacheStore {
    async fn seed(&self, entry: PrivilegeCacheEntry) {
        self.entries
            .lock()
            .await
            .insert(entry.role().clone(), entry);
    }

    async fn entry(&self, role: &str) -> Option<PrivilegeCacheEntry> {
        self.entries.lock().await.get(&role_code(role)).cloned()
    }
}

#[async_trait]
impl PrivilegeCacheStore for FakePrivilegeCacheStore {
    async fn get(&self, role: &RoleCode) -> AppResult<Option<PrivilegeCacheEntry>> {
        *self.reads.lock().await += 1;
        if self.fail_reads {
            return Err(AppError::Internal("cache store offline".to_owned()));
        }

        Ok(self.entries.lock().await.get(role).cloned())
    }

    async fn put(&self, role: &RoleCode, privileges: &[String], ttl_seconds: u32) -> AppResult<()> {
        *self.writes.lock().await += 1;
        let entry =
            PrivilegeCacheEntry::issue(role.clone(), privileges.to_vec(), Utc::now(), ttl_seconds);
        self.entries.lock().await.insert(role.clone(), entry);
        Ok(())
    }
}

#[derive(Default)]
struct FakePrivilegeDirectory {
    grants: HashMap<String, Vec<String>>,
    failing_roles: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakePrivilegeDirectory {
    fn with_grants(grants: &[(&str, &[&str])]) -> Self {
        Self {
            grants: grants
                .iter()
                .map(|(role, privileges)| {
                    (
                        (*role).to_owned(),
                        privileges.iter().map(|value| (*value).to_owned()).collect(),
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl PrivilegeDirectory for FakePrivilegeDirectory {
    async fn fetch_privileges(&self, role: &RoleCode) -> AppResult<Vec<String>> {
        self.calls.lock().await.push(role.as_str().to_owned());
        if self.failing_roles.contains(role.as_str()) {
            return Err(AppError::Unavailable(
                "privilege directory returned 503".to_owned(),
            ));
        }

        Ok(self.grants.get(role.as_str()).cloned().unwrap_or_default())
    }
}

fn role_code(value: &str) -> RoleCode {
    match RoleCode::new(value) {
        Ok(role) => role,
        Err(error) => panic!("invalid test role: {error}"),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn service(
    cache: Arc<FakePrivilegeCacheStore>,
    directory: Arc<FakePrivilegeDirectory>,
) -> PrivilegeResolutionService {
    PrivilegeResolutionService::new(cache, directory, TTL_SECONDS)
}

#[tokio::test]
async fn valid_cache_entry_is_served_without_directory_call() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    cache
        .seed(PrivilegeCacheEntry::issue(
            role_code("LAB_TECH"),
            strings(&["SAMPLE_READ", "SAMPLE_WRITE"]),
            Utc::now(),
            TTL_SECONDS,
        ))
        .await;
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[(
        "LAB_TECH",
        &["SOMETHING_ELSE"],
    )]));

    let resolution = service(cache.clone(), directory.clone())
        .resolve(&strings(&["LAB_TECH"]))
        .await;

    let Ok(resolution) = resolution else {
        panic!("resolution failed");
    };
    assert_eq!(resolution.privileges(), strings(&["SAMPLE_READ", "SAMPLE_WRITE"]));
    assert_eq!(directory.call_count().await, 0);
    assert_eq!(*cache.writes.lock().await, 0);
    assert!(matches!(
        resolution.outcomes()[0].1,
        RolePrivilegeOutcome::CacheHit(_)
    ));
}

#[tokio::test]
async fn missing_entry_fetches_once_and_caches_with_ttl() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[(
        "LAB_TECH",
        &["SAMPLE_READ"],
    )]));
    let before = Utc::now();

    let resolution = service(cache.clone(), directory.clone())
        .resolve(&strings(&["LAB_TECH"]))
        .await;

    let Ok(resolution) = resolution else {
        panic!("resolution failed");
    };
    assert_eq!(resolution.privileges(), strings(&["SAMPLE_READ"]));
    assert_eq!(directory.call_count().await, 1);

    let Some(entry) = cache.entry("LAB_TECH").await else {
        panic!("cache entry was not written");
    };
    let ttl = i64::from(TTL_SECONDS);
    assert!(entry.expire_at().timestamp() >= before.timestamp() + ttl);
    assert!(entry.expire_at().timestamp() <= Utc::now().timestamp() + ttl);
    assert_eq!(entry.privileges(), strings(&["SAMPLE_READ"]));
}

#[tokio::test]
async fn expired_admin_entry_is_refreshed_with_one_fetch() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let expired_at = Utc::now() - TimeDelta::hours(1);
    cache
        .seed(PrivilegeCacheEntry::from_parts(
            role_code("ADMIN"),
            strings(&["STALE"]),
            expired_at - TimeDelta::hours(1),
            expired_at,
        ))
        .await;
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[(
        "ADMIN",
        &["USER_MANAGE", "REPORT_READ"],
    )]));

    let resolution = service(cache.clone(), directory.clone())
        .resolve(&strings(&["ADMIN"]))
        .await;

    let Ok(resolution) = resolution else {
        panic!("resolution failed");
    };
    assert_eq!(directory.call_count().await, 1);
    assert_eq!(resolution.privileges(), strings(&["USER_MANAGE", "REPORT_READ"]));

    let Some(entry) = cache.entry("ADMIN").await else {
        panic!("cache entry missing");
    };
    assert!(entry.is_valid_at(Utc::now()));
    assert_eq!(entry.privileges(), strings(&["USER_MANAGE", "REPORT_READ"]));
}

#[tokio::test]
async fn directory_failure_degrades_to_empty_and_leaves_cache_untouched() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory {
        failing_roles: HashSet::from(["AUDITOR".to_owned()]),
        ..FakePrivilegeDirectory::default()
    });

    let resolution = service(cache.clone(), directory.clone())
        .resolve(&strings(&["AUDITOR"]))
        .await;

    let Ok(resolution) = resolution else {
        panic!("directory failure must not abort resolution");
    };
    assert!(resolution.privileges().is_empty());
    assert!(!resolution.is_complete());
    assert_eq!(resolution.degraded_roles().count(), 1);
    assert_eq!(*cache.writes.lock().await, 0);
    assert!(cache.entry("AUDITOR").await.is_none());
}

#[tokio::test]
async fn failed_role_is_retried_on_next_resolution() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory {
        failing_roles: HashSet::from(["AUDITOR".to_owned()]),
        ..FakePrivilegeDirectory::default()
    });
    let service = service(cache, directory.clone());

    assert!(service.resolve(&strings(&["AUDITOR"])).await.is_ok());
    assert!(service.resolve(&strings(&["AUDITOR"])).await.is_ok());
    assert_eq!(directory.call_count().await, 2);
}

#[tokio::test]
async fn union_of_roles_is_deduplicated_regardless_of_order() {
    let grants: &[(&str, &[&str])] = &[
        ("ADMIN", &["READ", "WRITE", "USER_MANAGE"]),
        ("LAB_TECH", &["READ", "SAMPLE_WRITE"]),
    ];
    let expected =
        BTreeSet::from(["READ", "WRITE", "USER_MANAGE", "SAMPLE_WRITE"].map(String::from));

    for roles in [["ADMIN", "LAB_TECH"], ["LAB_TECH", "ADMIN"]] {
        let directory = Arc::new(FakePrivilegeDirectory::with_grants(grants));
        let resolution = service(Arc::new(FakePrivilegeCacheStore::default()), directory)
            .resolve(&strings(&roles))
            .await;

        let Ok(resolution) = resolution else {
            panic!("resolution failed");
        };
        assert_eq!(resolution.privileges().len(), expected.len());
        let actual: BTreeSet<String> = resolution.into_privileges().into_iter().collect();
        assert_eq!(actual, expected);
    }
}

#[tokio::test]
async fn empty_role_list_performs_no_io() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory::default());

    let resolution = service(cache.clone(), directory.clone()).resolve(&[]).await;

    let Ok(resolution) = resolution else {
        panic!("resolution failed");
    };
    assert!(resolution.privileges().is_empty());
    assert!(resolution.outcomes().is_empty());
    assert_eq!(*cache.reads.lock().await, 0);
    assert_eq!(directory.call_count().await, 0);
}

#[tokio::test]
async fn malformed_role_aborts_before_any_io() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[("ADMIN", &["READ"])]));

    let result = service(cache.clone(), directory.clone())
        .resolve(&strings(&["ADMIN", "  "]))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(*cache.reads.lock().await, 0);
    assert_eq!(directory.call_count().await, 0);
}

#[tokio::test]
async fn duplicate_roles_are_resolved_once() {
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[("ADMIN", &["READ"])]));

    let resolution = service(Arc::new(FakePrivilegeCacheStore::default()), directory.clone())
        .resolve(&strings(&["ADMIN", "ADMIN"]))
        .await;

    assert!(resolution.is_ok());
    assert_eq!(directory.call_count().await, 1);
}

#[tokio::test]
async fn cache_read_failure_is_treated_as_a_miss() {
    let cache = Arc::new(FakePrivilegeCacheStore {
        fail_reads: true,
        ..FakePrivilegeCacheStore::default()
    });
    let directory = Arc::new(FakePrivilegeDirectory::with_grants(&[("ADMIN", &["READ"])]));

    let resolution = service(cache, directory.clone())
        .resolve(&strings(&["ADMIN"]))
        .await;

    let Ok(resolution) = resolution else {
        panic!("cache failure must not abort resolution");
    };
    assert_eq!(resolution.privileges(), strings(&["READ"]));
    assert_eq!(resolution.cache_warnings().len(), 1);
    assert_eq!(directory.call_count().await, 1);
}

#[tokio::test]
async fn empty_directory_answer_is_cached() {
    let cache = Arc::new(FakePrivilegeCacheStore::default());
    let directory = Arc::new(FakePrivilegeDirectory::default());
    let service = service(cache.clone(), directory.clone());

    assert!(service.resolve(&strings(&["GUEST"])).await.is_ok());
    assert!(service.resolve(&strings(&["GUEST"])).await.is_ok());

    assert_eq!(directory.call_count().await, 1);
    assert!(cache.entry("GUEST").await.is_some());
}
