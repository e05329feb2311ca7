use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::clients::CatalogClient;
use crate::domain::recommendation::Recommender;
use crate::proto::{self as pb, RecommendationService};

/// Draws suggestions from the live catalog, fetched on every request.
pub struct RecommendationServiceImpl {
    catalog: CatalogClient,
    recommender: Arc<dyn Recommender>,
    rpc: RpcObserver,
}

impl RecommendationServiceImpl {
    pub fn new(catalog: CatalogClient, recommender: Arc<dyn Recommender>, rpc: RpcObserver) -> Self {
        Self {
            catalog,
            recommender,
            rpc,
        }
    }
}

#[tonic::async_trait]
impl RecommendationService for RecommendationServiceImpl {
    #[tracing::instrument(skip_all, fields(user_id = %request.get_ref().user_id))]
    async fn list_recommendations(
        &self,
        request: Request<pb::ListRecommendationsRequest>,
    ) -> Result<Response<pb::ListRecommendationsResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("ListRecommendations", async {
                let catalog_ids: Vec<String> = self
                    .catalog
                    .list_products()
                    .await?
                    .into_iter()
                    .map(|p| p.id)
                    .collect();

                let product_ids = self.recommender.recommend(&catalog_ids, &req.product_ids);
                tracing::debug!(recommended = ?product_ids, "Recommendations");
                Ok(pb::ListRecommendationsResponse { product_ids })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::Upstream;
    use crate::domain::catalog::{CatalogStore, JsonFileSource};
    use crate::domain::recommendation::{RandomRecommender, MAX_RECOMMENDATIONS};
    use crate::proto::{
        ProductCatalogServiceServer, RecommendationServiceClient, RecommendationServiceServer,
    };
    use crate::services::{testing, ProductCatalogServiceImpl};
    use tonic::service::Routes;

    #[tokio::test]
    async fn test_recommends_unseen_catalog_products() {
        let source = JsonFileSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/products.json"));
        let store = Arc::new(CatalogStore::open(Arc::new(source)).unwrap());
        let catalog = ProductCatalogServiceImpl::new(store, RpcObserver::new("productcatalog"));
        let catalog_channel =
            testing::spawn(Routes::new(ProductCatalogServiceServer::new(catalog))).await;

        let service = RecommendationServiceImpl::new(
            CatalogClient::new(Upstream::from_channel("productcatalog", catalog_channel)),
            Arc::new(RandomRecommender),
            RpcObserver::new("recommendation"),
        );
        let channel = testing::spawn(Routes::new(RecommendationServiceServer::new(service))).await;
        let mut client = RecommendationServiceClient::new(channel);

        let ids = client
            .list_recommendations(pb::ListRecommendationsRequest {
                user_id: "u1".into(),
                product_ids: vec!["L9ECAV7KIM".into()],
            })
            .await
            .unwrap()
            .into_inner()
            .product_ids;

        assert_eq!(ids.len(), MAX_RECOMMENDATIONS);
        assert!(!ids.contains(&"L9ECAV7KIM".to_string()));
    }
}
