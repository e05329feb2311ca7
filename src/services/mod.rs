use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use tonic::service::Routes;
use tonic::transport::Server;
use tonic::{Response, Status};

use crate::domain::ServiceError;
use crate::metrics::Metrics;

// ============================================================================
// gRPC Services
// ============================================================================
//
// One plain struct per generated service trait, holding its domain
// dependencies. Handlers delegate to the domain layer and go through
// `RpcObserver` so failures are logged and counted the same way everywhere.
//
// ============================================================================

mod ad;
mod cart;
mod catalog;
mod checkout;
mod currency;
mod email;
mod payment;
mod recommendation;
mod shipping;

pub use ad::AdServiceImpl;
pub use cart::CartServiceImpl;
pub use catalog::ProductCatalogServiceImpl;
pub use checkout::{CheckoutDownstreams, CheckoutServiceImpl};
pub use currency::CurrencyServiceImpl;
pub use email::EmailServiceImpl;
pub use payment::PaymentServiceImpl;
pub use recommendation::RecommendationServiceImpl;
pub use shipping::ShippingServiceImpl;

/// Wraps handler bodies: maps `ServiceError` to a status and records the call.
#[derive(Clone)]
pub struct RpcObserver {
    service: &'static str,
    metrics: Option<Arc<Metrics>>,
}

impl RpcObserver {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn observe<T, F>(&self, method: &'static str, call: F) -> Result<Response<T>, Status>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let started = Instant::now();

        let result = call.await.map(Response::new).map_err(|err| {
            tracing::warn!(
                service = self.service,
                method,
                kind = err.kind(),
                error = %err,
                "RPC failed"
            );
            Status::from(err)
        });

        if let Some(metrics) = &self.metrics {
            let code = match &result {
                Ok(_) => tonic::Code::Ok,
                Err(status) => status.code(),
            };
            metrics.record_rpc(self.service, method, code, started);
        }

        result
    }
}

/// Serve `routes` on `0.0.0.0:port` until Ctrl-C.
pub async fn serve(name: &'static str, port: u16, routes: Routes) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(service = name, %addr, "🚀 gRPC service listening");

    Server::builder()
        .add_routes(routes)
        .serve_with_shutdown(addr, shutdown_signal(name))
        .await
        .with_context(|| format!("{name} server failed on {addr}"))
}

async fn shutdown_signal(name: &'static str) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!(service = name, "🛑 Shutting down");
}
