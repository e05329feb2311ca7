use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::store::CartStore;
use crate::domain::errors::ServiceError;
use crate::models::CartItem;

// ============================================================================
// Cart Repository
// ============================================================================
//
// `add_item` is load -> append -> save. Within one process, writes for the
// same user are serialized by a striped lock keyed on the user ID hash, so
// concurrent adds are never lost.
//
// Known race: two cart replicas sharing one Redis still interleave their
// read-modify-write cycles, and the last writer wins.
//
// ============================================================================

const LOCK_STRIPES: usize = 64;

pub struct CartRepository {
    store: Arc<dyn CartStore>,
    stripes: Vec<Mutex<()>>,
}

impl CartRepository {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self {
            store,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    fn stripe(&self, user_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % self.stripes.len()]
    }

    /// Appends the line; repeated adds of one product are kept as separate
    /// lines.
    pub async fn add_item(&self, user_id: &str, item: CartItem) -> Result<(), ServiceError> {
        if item.product_id.is_empty() {
            return Err(ServiceError::validation("product_id is required"));
        }
        if item.quantity < 0 {
            return Err(ServiceError::validation(format!(
                "quantity must be non-negative, got {}",
                item.quantity
            )));
        }

        let _guard = self.stripe(user_id).lock().await;

        let mut items = self.store.load(user_id).await?;
        items.push(item);
        self.store.save(user_id, &items).await?;

        tracing::debug!(user_id = %user_id, lines = items.len(), "Cart updated");
        Ok(())
    }

    pub async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError> {
        self.store.load(user_id).await
    }

    pub async fn empty_cart(&self, user_id: &str) -> Result<(), ServiceError> {
        let _guard = self.stripe(user_id).lock().await;
        self.store.delete(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::InMemoryCartStore;

    fn repository() -> Arc<CartRepository> {
        Arc::new(CartRepository::new(Arc::new(InMemoryCartStore::new())))
    }

    #[tokio::test]
    async fn test_add_get_empty() {
        let repo = repository();

        repo.add_item("u", CartItem::new("p1", 2)).await.unwrap();
        let cart = repo.get_cart("u").await.unwrap();
        assert_eq!(cart, vec![CartItem::new("p1", 2)]);

        repo.empty_cart("u").await.unwrap();
        assert!(repo.get_cart("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_instead_of_merging() {
        let repo = repository();
        repo.add_item("u", CartItem::new("p1", 1)).await.unwrap();
        repo.add_item("u", CartItem::new("p1", 1)).await.unwrap();

        let cart = repo.get_cart("u").await.unwrap();
        assert_eq!(cart, vec![CartItem::new("p1", 1), CartItem::new("p1", 1)]);
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_cart() {
        let repo = repository();
        assert!(repo.get_cart("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_invalid_items() {
        let repo = repository();
        assert!(matches!(
            repo.add_item("u", CartItem::new("p1", -1)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            repo.add_item("u", CartItem::new("", 1)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(repo.get_cart("u").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let repo = repository();

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.add_item("shared", CartItem::new(format!("p{i}"), 1))
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.get_cart("shared").await.unwrap().len(), 50);
    }
}
