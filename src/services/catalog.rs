use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::catalog::CatalogStore;
use crate::proto::{self as pb, ProductCatalogService};

pub struct ProductCatalogServiceImpl {
    store: Arc<CatalogStore>,
    extra_latency: Duration,
    rpc: RpcObserver,
}

impl ProductCatalogServiceImpl {
    pub fn new(store: Arc<CatalogStore>, rpc: RpcObserver) -> Self {
        Self {
            store,
            extra_latency: Duration::ZERO,
            rpc,
        }
    }

    /// Sleep this long before answering every RPC.
    pub fn with_extra_latency(mut self, latency: Duration) -> Self {
        self.extra_latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.extra_latency.is_zero() {
            tokio::time::sleep(self.extra_latency).await;
        }
    }
}

#[tonic::async_trait]
impl ProductCatalogService for ProductCatalogServiceImpl {
    #[tracing::instrument(skip_all)]
    async fn list_products(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::ListProductsResponse>, Status> {
        self.simulate_latency().await;
        self.rpc
            .observe("ListProducts", async {
                let products = self.store.list().await;
                Ok(pb::ListProductsResponse {
                    products: products.into_iter().map(Into::into).collect(),
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(product_id = %request.get_ref().id))]
    async fn get_product(
        &self,
        request: Request<pb::GetProductRequest>,
    ) -> Result<Response<pb::Product>, Status> {
        self.simulate_latency().await;
        let req = request.into_inner();
        self.rpc
            .observe("GetProduct", async { Ok(self.store.get(&req.id).await?.into()) })
            .await
    }

    #[tracing::instrument(skip_all, fields(query = %request.get_ref().query))]
    async fn search_products(
        &self,
        request: Request<pb::SearchProductsRequest>,
    ) -> Result<Response<pb::SearchProductsResponse>, Status> {
        self.simulate_latency().await;
        let req = request.into_inner();
        self.rpc
            .observe("SearchProducts", async {
                let results = self.store.search(&req.query).await;
                tracing::debug!(matches = results.len(), "Catalog search");
                Ok(pb::SearchProductsResponse {
                    results: results.into_iter().map(Into::into).collect(),
                })
            })
            .await
    }
}
