use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::shipping::{QuoteCalculator, TrackingIdGenerator};
use crate::models::{cart_size, Address, CartItem};
use crate::proto::{self as pb, required, ShippingService};

pub struct ShippingServiceImpl {
    quotes: QuoteCalculator,
    tracking: Arc<dyn TrackingIdGenerator>,
    rpc: RpcObserver,
}

impl ShippingServiceImpl {
    pub fn new(
        quotes: QuoteCalculator,
        tracking: Arc<dyn TrackingIdGenerator>,
        rpc: RpcObserver,
    ) -> Self {
        Self {
            quotes,
            tracking,
            rpc,
        }
    }
}

fn cart_items(items: Vec<pb::CartItem>) -> Vec<CartItem> {
    items.into_iter().map(CartItem::from).collect()
}

#[tonic::async_trait]
impl ShippingService for ShippingServiceImpl {
    #[tracing::instrument(skip_all, fields(items = request.get_ref().items.len()))]
    async fn get_quote(
        &self,
        request: Request<pb::GetQuoteRequest>,
    ) -> Result<Response<pb::GetQuoteResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("GetQuote", async {
                let items = cart_items(req.items);
                let cost = self.quotes.quote(&items)?;
                tracing::debug!(count = cart_size(&items), cost = %cost, "Quoted shipping");
                Ok(pb::GetQuoteResponse {
                    cost_usd: Some(cost.into()),
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(items = request.get_ref().items.len()))]
    async fn ship_order(
        &self,
        request: Request<pb::ShipOrderRequest>,
    ) -> Result<Response<pb::ShipOrderResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("ShipOrder", async {
                let address = Address::from(required(req.address, "address")?);
                let tracking_id = self.tracking.generate(&address.salt());
                tracing::info!(
                    tracking_id = %tracking_id,
                    city = %address.city,
                    country = %address.country,
                    "Order shipped"
                );
                Ok(pb::ShipOrderResponse { tracking_id })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipping::RandomTrackingIds;
    use crate::proto::{ShippingServiceClient, ShippingServiceServer};
    use crate::services::testing;
    use tonic::service::Routes;

    async fn client(quotes: QuoteCalculator) -> ShippingServiceClient<tonic::transport::Channel> {
        let service =
            ShippingServiceImpl::new(quotes, Arc::new(RandomTrackingIds), RpcObserver::new("shipping"));
        let channel = testing::spawn(Routes::new(ShippingServiceServer::new(service))).await;
        ShippingServiceClient::new(channel)
    }

    fn items() -> Vec<pb::CartItem> {
        vec![
            pb::CartItem { product_id: "OLJCESPC7Z".into(), quantity: 2 },
            pb::CartItem { product_id: "66VCHSJNUP".into(), quantity: 1 },
        ]
    }

    #[tokio::test]
    async fn test_quote_uses_item_count() {
        let mut client = client(QuoteCalculator::new(500, 100)).await;

        let cost = client
            .get_quote(pb::GetQuoteRequest { address: None, items: items() })
            .await
            .unwrap()
            .into_inner()
            .cost_usd
            .unwrap();
        assert_eq!(cost.currency_code, "USD");
        assert_eq!((cost.units, cost.nanos), (8, 0));
    }

    #[tokio::test]
    async fn test_ship_order_tracking_id_shape() {
        let mut client = client(QuoteCalculator::default()).await;

        let address = pb::Address {
            street_address: "1600 Amphitheatre Parkway".into(),
            city: "Mountain View".into(),
            state: "CA".into(),
            country: "United States".into(),
            zip_code: 94043,
        };
        let tracking_id = client
            .ship_order(pb::ShipOrderRequest { address: Some(address), items: items() })
            .await
            .unwrap()
            .into_inner()
            .tracking_id;

        // salt "1600 Amphitheatre Parkway, Mountain View, CA" is 44 chars
        let parts: Vec<&str> = tracking_id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].starts_with("44") && parts[1].len() == 5);
        assert!(parts[2].starts_with("22") && parts[2].len() == 9);
    }

    #[tokio::test]
    async fn test_ship_order_requires_address() {
        let mut client = client(QuoteCalculator::default()).await;

        let status = client
            .ship_order(pb::ShipOrderRequest { address: None, items: items() })
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
