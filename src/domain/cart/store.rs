use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::ServiceError;
use crate::models::CartItem;

/// Persistence for whole carts, keyed by user ID.
///
/// Stores only move blobs; ordering and locking live in `CartRepository`.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's lines, or an empty list for an unknown user.
    async fn load(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError>;

    async fn save(&self, user_id: &str, items: &[CartItem]) -> Result<(), ServiceError>;

    async fn delete(&self, user_id: &str) -> Result<(), ServiceError>;

    fn name(&self) -> &'static str;
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartItem>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError> {
        Ok(self
            .carts
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, user_id: &str, items: &[CartItem]) -> Result<(), ServiceError> {
        self.carts
            .write()
            .await
            .insert(user_id.to_string(), items.to_vec());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), ServiceError> {
        self.carts.write().await.remove(user_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
