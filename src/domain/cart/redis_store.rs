use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::store::CartStore;
use crate::domain::errors::ServiceError;
use crate::models::CartItem;

// ============================================================================
// Redis Cart Store
// ============================================================================
//
// Key = user ID, value = JSON array of `{"product_id", "quantity"}`. Keys
// never expire. The multiplexed connection is shared by all requests.
//
// ============================================================================

#[derive(Clone)]
pub struct RedisCartStore {
    conn: MultiplexedConnection,
}

fn storage_error(op: &str, user_id: &str, e: impl std::fmt::Display) -> ServiceError {
    tracing::error!(user_id = %user_id, error = %e, "Redis {} failed", op);
    ServiceError::Storage(format!("{op} cart for {user_id}: {e}"))
}

impl RedisCartStore {
    /// Connect to `host:port` or a full `redis://` URL.
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{addr}")
        };

        let client = redis::Client::open(url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!(addr = %addr, "Connected to Redis cart store");

        Ok(Self { conn })
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    async fn load(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError> {
        let mut conn = self.conn.clone();
        let blob: Option<String> = conn
            .get(user_id)
            .await
            .map_err(|e| storage_error("fetch", user_id, e))?;

        match blob {
            None => Ok(Vec::new()),
            Some(blob) => {
                serde_json::from_str(&blob).map_err(|e| storage_error("decode", user_id, e))
            }
        }
    }

    async fn save(&self, user_id: &str, items: &[CartItem]) -> Result<(), ServiceError> {
        let blob = serde_json::to_string(items).map_err(|e| storage_error("encode", user_id, e))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set(user_id, blob)
            .await
            .map_err(|e| storage_error("save", user_id, e))?;
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), ServiceError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(user_id)
            .await
            .map_err(|e| storage_error("delete", user_id, e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
