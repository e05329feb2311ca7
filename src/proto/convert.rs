use super::messages as pb;
use crate::domain::errors::ServiceError;
use crate::domain::money::Money;
use crate::models::{Ad, Address, CartItem, CreditCard, OrderItem, OrderResult, Product};

// ============================================================================
// Wire <-> Model Conversions
// ============================================================================
//
// Domain -> wire is infallible. Wire -> domain fails with a validation error
// when a required sub-message is absent.
//
// ============================================================================

pub fn required<T>(field: Option<T>, name: &str) -> Result<T, ServiceError> {
    field.ok_or_else(|| ServiceError::validation(format!("missing field `{name}`")))
}

// --- Money ------------------------------------------------------------------

impl From<Money> for pb::Money {
    fn from(m: Money) -> Self {
        pb::Money {
            currency_code: m.currency_code,
            units: m.units,
            nanos: m.nanos,
        }
    }
}

impl From<pb::Money> for Money {
    fn from(m: pb::Money) -> Self {
        Money::new(m.currency_code, m.units, m.nanos)
    }
}

// --- Product ----------------------------------------------------------------

impl From<Product> for pb::Product {
    fn from(p: Product) -> Self {
        pb::Product {
            id: p.id,
            name: p.name,
            description: p.description,
            picture: p.picture,
            price_usd: Some(p.price_usd.into()),
            categories: p.categories,
        }
    }
}

impl TryFrom<pb::Product> for Product {
    type Error = ServiceError;

    fn try_from(p: pb::Product) -> Result<Self, Self::Error> {
        Ok(Product {
            price_usd: required(p.price_usd, "price_usd")?.into(),
            id: p.id,
            name: p.name,
            description: p.description,
            picture: p.picture,
            categories: p.categories,
        })
    }
}

// --- Cart -------------------------------------------------------------------

impl From<CartItem> for pb::CartItem {
    fn from(item: CartItem) -> Self {
        pb::CartItem {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

impl From<pb::CartItem> for CartItem {
    fn from(item: pb::CartItem) -> Self {
        CartItem::new(item.product_id, item.quantity)
    }
}

// --- Address / card ---------------------------------------------------------

impl From<Address> for pb::Address {
    fn from(a: Address) -> Self {
        pb::Address {
            street_address: a.street_address,
            city: a.city,
            state: a.state,
            country: a.country,
            zip_code: a.zip_code,
        }
    }
}

impl From<pb::Address> for Address {
    fn from(a: pb::Address) -> Self {
        Address {
            street_address: a.street_address,
            city: a.city,
            state: a.state,
            country: a.country,
            zip_code: a.zip_code,
        }
    }
}

impl From<CreditCard> for pb::CreditCardInfo {
    fn from(c: CreditCard) -> Self {
        pb::CreditCardInfo {
            credit_card_number: c.number,
            credit_card_cvv: c.cvv,
            credit_card_expiration_year: c.expiration_year,
            credit_card_expiration_month: c.expiration_month,
        }
    }
}

impl From<pb::CreditCardInfo> for CreditCard {
    fn from(c: pb::CreditCardInfo) -> Self {
        CreditCard {
            number: c.credit_card_number,
            cvv: c.credit_card_cvv,
            expiration_year: c.credit_card_expiration_year,
            expiration_month: c.credit_card_expiration_month,
        }
    }
}

// --- Orders -----------------------------------------------------------------

impl From<OrderItem> for pb::OrderItem {
    fn from(o: OrderItem) -> Self {
        pb::OrderItem {
            item: Some(o.item.into()),
            cost: Some(o.cost.into()),
        }
    }
}

impl TryFrom<pb::OrderItem> for OrderItem {
    type Error = ServiceError;

    fn try_from(o: pb::OrderItem) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            item: required(o.item, "item")?.into(),
            cost: required(o.cost, "cost")?.into(),
        })
    }
}

impl From<OrderResult> for pb::OrderResult {
    fn from(o: OrderResult) -> Self {
        pb::OrderResult {
            order_id: o.order_id,
            shipping_tracking_id: o.shipping_tracking_id,
            shipping_cost: Some(o.shipping_cost.into()),
            shipping_address: Some(o.shipping_address.into()),
            items: o.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<pb::OrderResult> for OrderResult {
    type Error = ServiceError;

    fn try_from(o: pb::OrderResult) -> Result<Self, Self::Error> {
        let items = o
            .items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderResult {
            order_id: o.order_id,
            shipping_tracking_id: o.shipping_tracking_id,
            shipping_cost: required(o.shipping_cost, "shipping_cost")?.into(),
            shipping_address: o.shipping_address.map(Into::into).unwrap_or_default(),
            items,
        })
    }
}

// --- Ads --------------------------------------------------------------------

impl From<Ad> for pb::Ad {
    fn from(ad: Ad) -> Self {
        pb::Ad {
            redirect_url: ad.redirect_url,
            text: ad.text,
        }
    }
}

impl From<pb::Ad> for Ad {
    fn from(ad: pb::Ad) -> Self {
        Ad::new(ad.redirect_url, ad.text)
    }
}
