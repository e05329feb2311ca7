use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;

use super::source::CatalogSource;
use crate::domain::errors::ServiceError;
use crate::metrics::Metrics;
use crate::models::Product;

// ============================================================================
// Catalog Store - atomically swapped product snapshots
// ============================================================================
//
// Readers clone the snapshot `Arc` under the read lock and search it after the
// lock is released. A reload fetches from the source with no lock held, then
// swaps the whole snapshot under the write lock. A reader therefore sees one
// generation or the next, never a mix.
//
// Every load draws a ticket before touching the source. A load whose ticket
// is older than the last applied one is dropped, so overlapping reloads can
// only move the catalog forward.
//
// While reload is enabled every read re-fetches first, on the blocking pool.
// A read that finds an empty catalog also re-fetches. A failed fetch keeps
// the current snapshot.
//
// ============================================================================

#[derive(Debug)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub products: Vec<Product>,
}

struct CatalogState {
    snapshot: Arc<CatalogSnapshot>,
    /// Ticket of the load behind `snapshot`
    applied_ticket: u64,
    reload_enabled: bool,
}

pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    state: RwLock<CatalogState>,
    tickets: AtomicU64,
    metrics: Option<Arc<Metrics>>,
}

impl CatalogStore {
    /// Empty store at generation 0. The first read triggers a load.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            state: RwLock::new(CatalogState {
                snapshot: Arc::new(CatalogSnapshot {
                    generation: 0,
                    products: Vec::new(),
                }),
                applied_ticket: 0,
                reload_enabled: false,
            }),
            tickets: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Store with the initial catalog loaded. Fails if the source does.
    pub fn open(source: Arc<dyn CatalogSource>) -> Result<Self> {
        let store = Self::new(source);
        store.reload()?;
        Ok(store)
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_reload_enabled(&self, enabled: bool) {
        self.write_state().reload_enabled = enabled;
        tracing::info!(enabled, "Catalog reload toggled");
    }

    pub fn reload_enabled(&self) -> bool {
        self.read_state().reload_enabled
    }

    pub fn generation(&self) -> u64 {
        self.read_state().snapshot.generation
    }

    /// Fetch from the source and swap in a new generation. Returns the
    /// generation being served afterwards, which is unchanged when a newer
    /// load landed first.
    pub fn reload(&self) -> Result<u64> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;

        let products = match self.source.load() {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Catalog reload failed, keeping current snapshot"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_catalog_reload(None);
                }
                return Err(e);
            }
        };

        let count = products.len();
        let generation = {
            let mut state = self.write_state();
            if ticket < state.applied_ticket {
                tracing::debug!(ticket, "Newer catalog already applied, dropping load");
                return Ok(state.snapshot.generation);
            }
            let generation = state.snapshot.generation + 1;
            state.snapshot = Arc::new(CatalogSnapshot {
                generation,
                products,
            });
            state.applied_ticket = ticket;
            generation
        };

        tracing::debug!(generation, products = count, "Catalog snapshot swapped");
        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_reload(Some(generation));
        }
        Ok(generation)
    }

    /// The snapshot a read should be served from. A due reload runs on the
    /// blocking pool so source IO never stalls a runtime worker.
    async fn snapshot(self: &Arc<Self>) -> Arc<CatalogSnapshot> {
        let (snapshot, must_reload) = {
            let state = self.read_state();
            let must_reload = state.reload_enabled || state.snapshot.products.is_empty();
            (state.snapshot.clone(), must_reload)
        };

        if !must_reload {
            return snapshot;
        }

        let store = self.clone();
        match tokio::task::spawn_blocking(move || store.reload()).await {
            Ok(Ok(_)) => self.read_state().snapshot.clone(),
            Ok(Err(_)) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Catalog reload task failed");
                snapshot
            }
        }
    }

    pub async fn list(self: &Arc<Self>) -> Vec<Product> {
        self.snapshot().await.products.clone()
    }

    /// Exact, case-sensitive ID lookup. First match wins.
    pub async fn get(self: &Arc<Self>, id: &str) -> Result<Product, ServiceError> {
        self.snapshot()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("no product with ID {id}")))
    }

    /// Case-insensitive substring search over name and description, in
    /// catalog order.
    pub async fn search(self: &Arc<Self>, query: &str) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.snapshot()
            .await
            .products
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
