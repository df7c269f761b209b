use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use redis::AsyncCommands;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = check_postgres(state.postgres_pool.clone()).await;
    let redis = check_redis(state.redis_client.clone()).await;

    let ready = is_usable(postgres.status) && is_usable(redis.status);
    let status = if ready { "ok" } else { "degraded" };
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            postgres,
            redis,
        }),
    )
}

/// A disabled dependency has an in-memory stand-in and does not block readiness.
fn is_usable(status: &str) -> bool {
    status == "ok" || status == "disabled"
}

async fn check_postgres(pool: Option<sqlx::PgPool>) -> HealthDependencyStatus {
    match pool {
        Some(pool) => dependency_status(Some(ping_postgres(&pool).await)),
        None => dependency_status(None),
    }
}

async fn check_redis(redis_client: Option<redis::Client>) -> HealthDependencyStatus {
    match redis_client {
        Some(redis_client) => dependency_status(Some(ping_redis(&redis_client).await)),
        None => dependency_status(None),
    }
}

/// `None` means the dependency is not configured.
fn dependency_status(outcome: Option<Result<(), String>>) -> HealthDependencyStatus {
    let (status, detail) = match outcome {
        None => ("disabled", None),
        Some(Ok(())) => ("ok", None),
        Some(Err(detail)) => ("error", Some(detail)),
    };

    HealthDependencyStatus { status, detail }
}

async fn ping_postgres(pool: &sqlx::PgPool) -> Result<(), String> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
        .map_err(|error| format!("postgres check failed: {error}"))
}

async fn ping_redis(redis_client: &redis::Client) -> Result<(), String> {
    let mut connection = redis_client
        .get_multiplexed_async_connection()
        .await
        .map_err(|error| format!("redis connection failed: {error}"))?;

    let reply = connection
        .ping::<String>()
        .await
        .map_err(|error| format!("redis ping failed: {error}"))?;
    if !reply.eq_ignore_ascii_case("pong") {
        return Err(format!("unexpected redis ping response: {reply}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dependency_status, is_usable};

    #[test]
    fn unconfigured_dependency_is_disabled_and_usable() {
        let status = dependency_status(None);

        assert_eq!(status.status, "disabled");
        assert!(status.detail.is_none());
        assert!(is_usable(status.status));
    }

    #[test]
    fn failed_check_keeps_its_detail_and_blocks_readiness() {
        let status = dependency_status(Some(Err("redis ping failed: refused".to_owned())));

        assert_eq!(status.status, "error");
        assert_eq!(status.detail.as_deref(), Some("redis ping failed: refused"));
        assert!(!is_usable(status.status));
        assert!(is_usable(dependency_status(Some(Ok(()))).status));
    }
}
