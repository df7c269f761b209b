//! PostgreSQL-backed identity mapping repository.

use async_trait::async_trait;
use sqlx::PgPool;

use labmesh_application::IdentityMappingRepository;
use labmesh_core::{AppError, AppResult};
use labmesh_domain::{IdentityMapping, InternalUserId};

/// PostgreSQL implementation of the identity mapping repository port.
#[derive(Clone)]
pub struct PostgresIdentityMappingRepository {
    pool: PgPool,
}

impl PostgresIdentityMappingRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IdentityMappingRow {
    external_subject: String,
    internal_user_id: uuid::Uuid,
}

impl From<IdentityMappingRow> for IdentityMapping {
    fn from(row: IdentityMappingRow) -> Self {
        Self {
            external_subject: row.external_subject,
            internal_user_id: InternalUserId::from_uuid(row.internal_user_id),
        }
    }
}

#[async_trait]
impl IdentityMappingRepository for PostgresIdentityMappingRepository {
    async fn find_by_external_subject(
        &self,
        external_subject: &str,
    ) -> AppResult<Option<IdentityMapping>> {
        let row = sqlx::query_as::<_, IdentityMappingRow>(
            r#"
            SELECT external_subject, internal_user_id
            FROM identity_mappings
            WHERE external_subject = $1
            LIMIT 1
            "#,
        )
        .bind(external_subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find identity mapping: {error}"))
        })?;

        Ok(row.map(IdentityMapping::from))
    }

    async fn insert_if_absent(&self, mapping: IdentityMapping) -> AppResult<IdentityMapping> {
        sqlx::query(
            r#"
            INSERT INTO identity_mappings (external_subject, internal_user_id)
            VALUES ($1, $2)
            ON CONFLICT (external_subject) DO NOTHING
            "#,
        )
        .bind(mapping.external_subject.as_str())
        .bind(mapping.internal_user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert identity mapping: {error}"))
        })?;

        // A concurrent registration may have won; the stored row is authoritative.
        self.find_by_external_subject(mapping.external_subject.as_str())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "identity mapping for '{}' missing after insert",
                    mapping.external_subject
                ))
            })
    }
}
