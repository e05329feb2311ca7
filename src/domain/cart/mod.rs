// ============================================================================
// Cart
// ============================================================================
//
// - store.rs       - `CartStore` trait and the in-memory store
// - redis_store.rs - Redis-backed store (JSON blob per user)
// - repository.rs  - add/get/empty with per-user serialization
//
// ============================================================================

mod redis_store;
mod repository;
mod store;

pub use redis_store::RedisCartStore;
pub use repository::CartRepository;
pub use store::{CartStore, InMemoryCartStore};
