use serde::{Deserialize, Serialize};

use crate::domain::money::Money;

// ============================================================================
// Shared Models
// ============================================================================
//
// Plain value objects passed between the domain layer, the gRPC adapters and
// the frontend. Wire conversion lives in `proto::convert`.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub picture: String,
    #[serde(alias = "price_usd")]
    pub price_usd: Money,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Product {
    /// Case-insensitive substring match over name and description.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

/// One cart line. Serialized as `{"product_id": .., "quantity": ..}` in the
/// cart store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Total number of units across all lines.
pub fn cart_size(items: &[CartItem]) -> i64 {
    items.iter().map(|item| item.quantity.max(0) as i64).sum()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: i32,
}

impl Address {
    /// `"street, city, state"`, the salt used for tracking IDs.
    pub fn salt(&self) -> String {
        format!("{}, {}, {}", self.street_address, self.city, self.state)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreditCard {
    pub number: String,
    pub cvv: i32,
    pub expiration_year: i32,
    pub expiration_month: i32,
}

impl CreditCard {
    pub fn last_four(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or("")
    }
}

// Masked form for logs
impl std::fmt::Display for CreditCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "****{} exp {:02}/{:04}",
            self.last_four(),
            self.expiration_month,
            self.expiration_year
        )
    }
}

/// A purchased line: the cart item plus its unit price in the user currency.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub item: CartItem,
    pub cost: Money,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderResult {
    pub order_id: String,
    pub shipping_tracking_id: String,
    pub shipping_cost: Money,
    pub shipping_address: Address,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Ad {
    pub redirect_url: String,
    pub text: String,
}

impl Ad {
    pub fn new(redirect_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            redirect_url: redirect_url.into(),
            text: text.into(),
        }
    }
}
