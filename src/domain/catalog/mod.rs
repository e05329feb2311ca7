// ============================================================================
// Product Catalog
// ============================================================================
//
// - source.rs - where snapshots come from
// - store.rs  - the owned store serving reads from the current snapshot
//
// Reload control arrives as actor messages, see `actors::catalog_reloader`.
//
// ============================================================================

mod source;
mod store;

pub use source::JsonFileSource;
#[cfg(test)]
pub use source::StaticSource;
pub use store::CatalogStore;
