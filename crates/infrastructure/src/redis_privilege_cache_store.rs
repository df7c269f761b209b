//! Redis-backed privilege cache store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use labmesh_application::PrivilegeCacheStore;
use labmesh_core::{AppError, AppResult};
use labmesh_domain::{PrivilegeCacheEntry, RoleCode};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Persisted layout of one cache entry. Timestamps are seconds since the epoch.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPrivilegeCacheEntry {
    role: String,
    privileges: Vec<String>,
    created_at: i64,
    expire_at: i64,
}

/// Redis implementation of the privilege cache store port.
///
/// Entries are written with `SET .. EX ttl`, so Redis evicts them on its own;
/// `expireAt` is stored alongside for the read-side validity check.
#[derive(Clone)]
pub struct RedisPrivilegeCacheStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPrivilegeCacheStore {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, role: &RoleCode) -> String {
        format!("{}:{}", self.key_prefix, role.as_str())
    }

    fn encode_entry(entry: &PrivilegeCacheEntry) -> AppResult<String> {
        serde_json::to_string(&StoredPrivilegeCacheEntry {
            role: entry.role().as_str().to_owned(),
            privileges: entry.privileges().to_vec(),
            created_at: entry.created_at().timestamp(),
            expire_at: entry.expire_at().timestamp(),
        })
        .map_err(|error| {
            AppError::Internal(format!("failed to encode privilege cache entry: {error}"))
        })
    }

    fn decode_entry(value: &str) -> AppResult<PrivilegeCacheEntry> {
        let stored: StoredPrivilegeCacheEntry = serde_json::from_str(value).map_err(|error| {
            AppError::Internal(format!("invalid privilege cache entry '{value}': {error}"))
        })?;

        Ok(PrivilegeCacheEntry::from_parts(
            RoleCode::new(stored.role)?,
            stored.privileges,
            parse_timestamp(stored.created_at, "createdAt")?,
            parse_timestamp(stored.expire_at, "expireAt")?,
        ))
    }
}

#[async_trait]
impl PrivilegeCacheStore for RedisPrivilegeCacheStore {
    async fn get(&self, role: &RoleCode) -> AppResult<Option<PrivilegeCacheEntry>> {
        let key = self.key_for(role);
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let encoded: Option<String> = connection.get(key).await.map_err(|error| {
            AppError::Internal(format!("failed to read privilege cache entry: {error}"))
        })?;

        encoded.as_deref().map(Self::decode_entry).transpose()
    }

    async fn put(&self, role: &RoleCode, privileges: &[String], ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let entry =
            PrivilegeCacheEntry::issue(role.clone(), privileges.to_vec(), Utc::now(), ttl_seconds);
        let value = Self::encode_entry(&entry)?;
        let key = self.key_for(role);
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        connection
            .set_ex(key, value, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write privilege cache entry: {error}"))
            })
    }
}

fn parse_timestamp(seconds: i64, field_name: &str) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        AppError::Internal(format!(
            "invalid privilege cache field '{field_name}' value '{seconds}'"
        ))
    })
}
