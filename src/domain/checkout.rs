use uuid::Uuid;

use super::money::{Money, MoneyError};
use crate::models::OrderItem;

// ============================================================================
// Checkout - order totals and order IDs
// ============================================================================

/// Shipping cost plus `cost * quantity` for every line. All amounts must share
/// one currency.
pub fn compute_total(shipping: &Money, items: &[OrderItem]) -> Result<Money, MoneyError> {
    items.iter().try_fold(shipping.normalized()?, |total, line| {
        let quantity = u32::try_from(line.item.quantity).unwrap_or(0);
        total.add(&line.cost.multiply(quantity)?)
    })
}

pub trait OrderIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidOrderIds;

impl OrderIdGenerator for UuidOrderIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
