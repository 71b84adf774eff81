use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::ApiResult;

/// String key/value persistence for client state.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> ApiResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ApiResult<()>;
    async fn remove(&self, key: &str) -> ApiResult<()>;
}

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET \
                value = excluded.value, \
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')"
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
