use super::Upstream;
use crate::domain::{Money, ServiceError};
use crate::models::{Ad, Address, CartItem, CreditCard, OrderResult, Product};
use crate::proto::{
    self as pb, required, AdServiceClient, CartServiceClient, CheckoutServiceClient,
    CurrencyServiceClient, EmailServiceClient, PaymentServiceClient, ProductCatalogServiceClient,
    RecommendationServiceClient, ShippingServiceClient,
};

// ============================================================================
// Typed Clients - one per downstream service, speaking domain models
// ============================================================================
//
// Writes that must not be applied twice (cart appends, charges, shipments and
// orders) go through `call_once`; reads may be retried.
//
// ============================================================================

fn products(raw: Vec<pb::Product>) -> Result<Vec<Product>, ServiceError> {
    raw.into_iter().map(Product::try_from).collect()
}

#[derive(Clone)]
pub struct CartClient(Upstream);

impl CartClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn add_item(&self, user_id: &str, item: &CartItem) -> Result<(), ServiceError> {
        let mut client = CartServiceClient::new(self.0.channel());
        let request = pb::AddItemRequest {
            user_id: user_id.to_string(),
            item: Some(item.clone().into()),
        };
        self.0
            .call_once(async move { client.add_item(request).await.map(|_| ()) })
            .await
    }

    pub async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError> {
        let cart = self
            .0
            .call(|| {
                let mut client = CartServiceClient::new(self.0.channel());
                let request = pb::GetCartRequest {
                    user_id: user_id.to_string(),
                };
                async move { client.get_cart(request).await }
            })
            .await?
            .into_inner();

        Ok(cart.items.into_iter().map(CartItem::from).collect())
    }

    pub async fn empty_cart(&self, user_id: &str) -> Result<(), ServiceError> {
        self.0
            .call(|| {
                let mut client = CartServiceClient::new(self.0.channel());
                let request = pb::EmptyCartRequest {
                    user_id: user_id.to_string(),
                };
                async move { client.empty_cart(request).await.map(|_| ()) }
            })
            .await
    }
}

#[derive(Clone)]
pub struct CatalogClient(Upstream);

impl CatalogClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        let response = self
            .0
            .call(|| {
                let mut client = ProductCatalogServiceClient::new(self.0.channel());
                async move { client.list_products(pb::Empty {}).await }
            })
            .await?
            .into_inner();

        products(response.products)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ServiceError> {
        let product = self
            .0
            .call(|| {
                let mut client = ProductCatalogServiceClient::new(self.0.channel());
                let request = pb::GetProductRequest { id: id.to_string() };
                async move { client.get_product(request).await }
            })
            .await?
            .into_inner();

        Product::try_from(product)
    }
}

#[derive(Clone)]
pub struct CurrencyClient(Upstream);

impl CurrencyClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn supported_currencies(&self) -> Result<Vec<String>, ServiceError> {
        let response = self
            .0
            .call(|| {
                let mut client = CurrencyServiceClient::new(self.0.channel());
                async move { client.get_supported_currencies(pb::Empty {}).await }
            })
            .await?
            .into_inner();

        Ok(response.currency_codes)
    }

    /// Amounts already in `to_code` are returned without a round trip.
    pub async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError> {
        if from.currency_code == to_code {
            return Ok(from.clone());
        }

        let converted = self
            .0
            .call(|| {
                let mut client = CurrencyServiceClient::new(self.0.channel());
                let request = pb::CurrencyConversionRequest {
                    from: Some(from.clone().into()),
                    to_code: to_code.to_string(),
                };
                async move { client.convert(request).await }
            })
            .await?
            .into_inner();

        Ok(converted.into())
    }
}

#[derive(Clone)]
pub struct ShippingClient(Upstream);

impl ShippingClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    /// Quote in USD.
    pub async fn get_quote(
        &self,
        address: Option<&Address>,
        items: &[CartItem],
    ) -> Result<Money, ServiceError> {
        let response = self
            .0
            .call(|| {
                let mut client = ShippingServiceClient::new(self.0.channel());
                let request = pb::GetQuoteRequest {
                    address: address.cloned().map(Into::into),
                    items: items.iter().cloned().map(Into::into).collect(),
                };
                async move { client.get_quote(request).await }
            })
            .await?
            .into_inner();

        required(response.cost_usd, "cost_usd").map(Money::from)
    }

    pub async fn ship_order(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<String, ServiceError> {
        let mut client = ShippingServiceClient::new(self.0.channel());
        let request = pb::ShipOrderRequest {
            address: Some(address.clone().into()),
            items: items.iter().cloned().map(Into::into).collect(),
        };
        let response = self
            .0
            .call_once(async move { client.ship_order(request).await })
            .await?
            .into_inner();

        Ok(response.tracking_id)
    }
}

#[derive(Clone)]
pub struct PaymentClient(Upstream);

impl PaymentClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    /// Returns the transaction ID.
    pub async fn charge(&self, amount: &Money, card: &CreditCard) -> Result<String, ServiceError> {
        let mut client = PaymentServiceClient::new(self.0.channel());
        let request = pb::ChargeRequest {
            amount: Some(amount.clone().into()),
            credit_card: Some(card.clone().into()),
        };
        let response = self
            .0
            .call_once(async move { client.charge(request).await })
            .await?
            .into_inner();

        Ok(response.transaction_id)
    }
}

#[derive(Clone)]
pub struct EmailClient(Upstream);

impl EmailClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        self.0
            .call(|| {
                let mut client = EmailServiceClient::new(self.0.channel());
                let request = pb::SendOrderConfirmationRequest {
                    email: email.to_string(),
                    order: Some(order.clone().into()),
                };
                async move { client.send_order_confirmation(request).await.map(|_| ()) }
            })
            .await
    }
}

/// Everything the checkout service needs to place one order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: String,
    pub user_currency: String,
    pub address: Address,
    pub email: String,
    pub credit_card: CreditCard,
}

impl From<PlaceOrder> for pb::PlaceOrderRequest {
    fn from(order: PlaceOrder) -> Self {
        Self {
            user_id: order.user_id,
            user_currency: order.user_currency,
            address: Some(order.address.into()),
            email: order.email,
            credit_card: Some(order.credit_card.into()),
        }
    }
}

#[derive(Clone)]
pub struct CheckoutClient(Upstream);

impl CheckoutClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn place_order(&self, order: &PlaceOrder) -> Result<OrderResult, ServiceError> {
        let mut client = CheckoutServiceClient::new(self.0.channel());
        let request = pb::PlaceOrderRequest::from(order.clone());
        let response = self
            .0
            .call_once(async move { client.place_order(request).await })
            .await?
            .into_inner();

        OrderResult::try_from(required(response.order, "order")?)
    }
}

#[derive(Clone)]
pub struct RecommendationClient(Upstream);

impl RecommendationClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn list_recommendations(
        &self,
        user_id: &str,
        product_ids: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        let response = self
            .0
            .call(|| {
                let mut client = RecommendationServiceClient::new(self.0.channel());
                let request = pb::ListRecommendationsRequest {
                    user_id: user_id.to_string(),
                    product_ids: product_ids.to_vec(),
                };
                async move { client.list_recommendations(request).await }
            })
            .await?
            .into_inner();

        Ok(response.product_ids)
    }
}

#[derive(Clone)]
pub struct AdClient(Upstream);

impl AdClient {
    pub fn new(upstream: Upstream) -> Self {
        Self(upstream)
    }

    pub async fn get_ads(&self, context_keys: &[String]) -> Result<Vec<Ad>, ServiceError> {
        let response = self
            .0
            .call(|| {
                let mut client = AdServiceClient::new(self.0.channel());
                let request = pb::AdRequest {
                    context_keys: context_keys.to_vec(),
                };
                async move { client.get_ads(request).await }
            })
            .await?
            .into_inner();

        Ok(response.ads.into_iter().map(Ad::from).collect())
    }
}
