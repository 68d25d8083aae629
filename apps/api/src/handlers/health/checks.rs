use redis::AsyncCommands;
use sqlx::PgPool;

use crate::dto::HealthDependencyStatus;

pub(super) async fn check_postgres(pool: PgPool) -> HealthDependencyStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
    {
        Ok(_) => HealthDependencyStatus::ok(),
        Err(error) => HealthDependencyStatus::failed(format!("postgres check failed: {error}")),
    }
}

/// Pings Redis when the change transport uses it.
pub(super) async fn check_redis(
    redis_client: Option<redis::Client>,
    redis_required: bool,
) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        return if redis_required {
            HealthDependencyStatus::failed("redis client is not configured")
        } else {
            HealthDependencyStatus::disabled()
        };
    };

    let pong = async {
        let mut connection = redis_client.get_multiplexed_async_connection().await?;
        connection.ping::<String>().await
    };

    match pong.await {
        Ok(reply) if reply.eq_ignore_ascii_case("pong") => HealthDependencyStatus::ok(),
        Ok(reply) => {
            HealthDependencyStatus::failed(format!("unexpected redis ping reply: {reply}"))
        }
        Err(error) => HealthDependencyStatus::failed(format!("redis ping failed: {error}")),
    }
}
