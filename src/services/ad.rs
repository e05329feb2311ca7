use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::ads::AdSelector;
use crate::proto::{self as pb, AdService};

pub struct AdServiceImpl {
    selector: Arc<dyn AdSelector>,
    rpc: RpcObserver,
}

impl AdServiceImpl {
    pub fn new(selector: Arc<dyn AdSelector>, rpc: RpcObserver) -> Self {
        Self { selector, rpc }
    }
}

#[tonic::async_trait]
impl AdService for AdServiceImpl {
    #[tracing::instrument(skip_all, fields(context_keys = ?request.get_ref().context_keys))]
    async fn get_ads(
        &self,
        request: Request<pb::AdRequest>,
    ) -> Result<Response<pb::AdResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("GetAds", async {
                let ads = self.selector.select(&req.context_keys);
                Ok(pb::AdResponse {
                    ads: ads.into_iter().map(Into::into).collect(),
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ads::{CategoryAdSelector, MAX_RANDOM_ADS};
    use crate::proto::{AdServiceClient, AdServiceServer};
    use crate::services::testing;
    use tonic::service::Routes;

    #[tokio::test]
    async fn test_ads_by_category_and_random() {
        let service = AdServiceImpl::new(
            Arc::new(CategoryAdSelector::default()),
            RpcObserver::new("ad"),
        );
        let channel = testing::spawn(Routes::new(AdServiceServer::new(service))).await;
        let mut client = AdServiceClient::new(channel);

        let ads = client
            .get_ads(pb::AdRequest { context_keys: vec!["footwear".into()] })
            .await
            .unwrap()
            .into_inner()
            .ads;
        assert_eq!(ads.len(), 1);
        assert!(ads[0].redirect_url.contains("L9ECAV7KIM"));

        let ads = client
            .get_ads(pb::AdRequest { context_keys: vec![] })
            .await
            .unwrap()
            .into_inner()
            .ads;
        assert_eq!(ads.len(), MAX_RANDOM_ADS);
    }
}
