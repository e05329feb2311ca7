use std::sync::Arc;

use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::reply::{Reply, ReplyError};
use kameo::Actor;

use crate::domain::catalog::CatalogStore;

// ============================================================================
// Catalog Reloader Actor - reload control for the catalog store
// ============================================================================
//
// The only writer of the store's reload flag. Operators reach it through
// messages; on Unix, SIGUSR1/SIGUSR2 are forwarded here as Enable/Disable.
//
// ============================================================================

// ============================================================================
// Messages
// ============================================================================

/// Re-fetch the catalog on every read
#[derive(Debug)]
pub struct EnableReload;

/// Serve reads from the current snapshot
#[derive(Debug)]
pub struct DisableReload;

/// Swap in a fresh snapshot once
#[derive(Debug)]
pub struct ReloadNow;

#[derive(Debug, Clone, PartialEq)]
pub struct ReloadOutcome {
    /// New generation, or None when the source failed
    pub generation: Option<u64>,
}

impl Reply for ReloadOutcome {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

// ============================================================================
// Catalog Reloader Actor
// ============================================================================

pub struct CatalogReloader {
    store: Arc<CatalogStore>,
}

impl CatalogReloader {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

impl Actor for CatalogReloader {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(generation = state.store.generation(), "CatalogReloader started");
        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<EnableReload> for CatalogReloader {
    type Reply = ();

    async fn handle(
        &mut self,
        _msg: EnableReload,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        tracing::info!("Enabling catalog reload");
        self.store.set_reload_enabled(true);
    }
}

impl Message<DisableReload> for CatalogReloader {
    type Reply = ();

    async fn handle(
        &mut self,
        _msg: DisableReload,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        tracing::info!("Disabling catalog reload");
        self.store.set_reload_enabled(false);
    }
}

impl Message<ReloadNow> for CatalogReloader {
    type Reply = ReloadOutcome;

    async fn handle(
        &mut self,
        _msg: ReloadNow,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let store = self.store.clone();
        // File IO stays off the actor's executor thread
        let generation = tokio::task::spawn_blocking(move || store.reload().ok())
            .await
            .ok()
            .flatten();

        ReloadOutcome { generation }
    }
}

// ============================================================================
// Signal Adapter
// ============================================================================

/// Forward SIGUSR1 (enable) and SIGUSR2 (disable) to the reloader.
#[cfg(unix)]
pub fn forward_reload_signals(reloader: ActorRef<CatalogReloader>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut enable = signal(SignalKind::user_defined1())?;
    let mut disable = signal(SignalKind::user_defined2())?;

    tokio::spawn(async move {
        loop {
            let sent = tokio::select! {
                Some(()) = enable.recv() => reloader.tell(EnableReload).send().await.is_ok(),
                Some(()) = disable.recv() => reloader.tell(DisableReload).send().await.is_ok(),
                else => break,
            };
            if !sent {
                tracing::warn!("CatalogReloader is gone, stopping signal forwarding");
                break;
            }
        }
    });

    tracing::info!("📡 Catalog reload signals armed (SIGUSR1 enable, SIGUSR2 disable)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::StaticSource;
    use kameo::prelude::*;

    fn store() -> Arc<CatalogStore> {
        Arc::new(CatalogStore::open(Arc::new(StaticSource::new(vec![]))).unwrap())
    }

    #[tokio::test]
    async fn test_messages_toggle_reload() {
        let store = store();
        let reloader = CatalogReloader::spawn(CatalogReloader::new(store.clone()));

        reloader.tell(EnableReload).send().await.unwrap();
        // Mailbox order: the ask is handled after the tell
        let outcome = reloader.ask(ReloadNow).await.unwrap();
        assert_eq!(outcome.generation, Some(2));
        assert!(store.reload_enabled());

        reloader.tell(DisableReload).send().await.unwrap();
        reloader.ask(ReloadNow).await.unwrap();
        assert!(!store.reload_enabled());
    }
}
