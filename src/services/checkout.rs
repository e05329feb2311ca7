use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::clients::{CartClient, CatalogClient, CurrencyClient, EmailClient, PaymentClient, ShippingClient};
use crate::domain::checkout::{compute_total, OrderIdGenerator};
use crate::domain::{Money, ServiceError};
use crate::models::{Address, CartItem, CreditCard, OrderItem, OrderResult};
use crate::proto::{self as pb, required, CheckoutService};

// ============================================================================
// Checkout Service - order orchestration
// ============================================================================
//
// PlaceOrder runs, in order:
//   cart -> catalog + currency (prices) -> shipping quote -> payment
//   -> shipping -> empty cart -> email
//
// Any failure before the charge aborts the order with nothing charged.
// The confirmation email is best effort.
//
// ============================================================================

#[derive(Clone)]
pub struct CheckoutDownstreams {
    pub cart: CartClient,
    pub catalog: CatalogClient,
    pub currency: CurrencyClient,
    pub shipping: ShippingClient,
    pub payment: PaymentClient,
    pub email: EmailClient,
}

pub struct CheckoutServiceImpl {
    downstream: CheckoutDownstreams,
    order_ids: Arc<dyn OrderIdGenerator>,
    rpc: RpcObserver,
}

struct PreparedOrder {
    items: Vec<OrderItem>,
    shipping_cost: Money,
}

impl CheckoutServiceImpl {
    pub fn new(
        downstream: CheckoutDownstreams,
        order_ids: Arc<dyn OrderIdGenerator>,
        rpc: RpcObserver,
    ) -> Self {
        Self {
            downstream,
            order_ids,
            rpc,
        }
    }

    async fn prepare_order(
        &self,
        user_id: &str,
        currency: &str,
        address: &Address,
    ) -> Result<(Vec<CartItem>, PreparedOrder), ServiceError> {
        let cart = self.downstream.cart.get_cart(user_id).await?;

        let mut items = Vec::with_capacity(cart.len());
        for item in &cart {
            let product = self.downstream.catalog.get_product(&item.product_id).await?;
            let cost = self
                .downstream
                .currency
                .convert(&product.price_usd, currency)
                .await?;
            items.push(OrderItem {
                item: item.clone(),
                cost,
            });
        }

        let quote_usd = self.downstream.shipping.get_quote(Some(address), &cart).await?;
        let shipping_cost = self.downstream.currency.convert(&quote_usd, currency).await?;

        Ok((cart, PreparedOrder { items, shipping_cost }))
    }

    async fn place(
        &self,
        user_id: String,
        currency: String,
        address: Address,
        email: String,
        card: CreditCard,
    ) -> Result<OrderResult, ServiceError> {
        let order_id = self.order_ids.next_id();
        let (cart, prepared) = self.prepare_order(&user_id, &currency, &address).await?;

        let total = compute_total(&prepared.shipping_cost, &prepared.items)?;
        let transaction_id = self.downstream.payment.charge(&total, &card).await?;
        tracing::info!(
            order_id = %order_id,
            transaction_id = %transaction_id,
            total = %total,
            "💳 Payment went through"
        );

        let shipping_tracking_id = self.downstream.shipping.ship_order(&address, &cart).await?;
        self.downstream.cart.empty_cart(&user_id).await?;

        let order = OrderResult {
            order_id,
            shipping_tracking_id,
            shipping_cost: prepared.shipping_cost,
            shipping_address: address,
            items: prepared.items,
        };

        if let Err(e) = self
            .downstream
            .email
            .send_order_confirmation(&email, &order)
            .await
        {
            tracing::warn!(
                order_id = %order.order_id,
                error = %e,
                "Failed to send order confirmation"
            );
        }

        Ok(order)
    }
}

#[tonic::async_trait]
impl CheckoutService for CheckoutServiceImpl {
    #[tracing::instrument(
        skip_all,
        fields(user_id = %request.get_ref().user_id, currency = %request.get_ref().user_currency)
    )]
    async fn place_order(
        &self,
        request: Request<pb::PlaceOrderRequest>,
    ) -> Result<Response<pb::PlaceOrderResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("PlaceOrder", async {
                let address = Address::from(required(req.address, "address")?);
                let card = CreditCard::from(required(req.credit_card, "credit_card")?);
                if req.user_currency.is_empty() {
                    return Err(ServiceError::validation("user_currency is required"));
                }

                let order = self
                    .place(req.user_id, req.user_currency, address, req.email, card)
                    .await?;
                tracing::info!(order_id = %order.order_id, "✅ Order placed");

                Ok(pb::PlaceOrderResponse {
                    order: Some(order.into()),
                })
            })
            .await
    }
}
