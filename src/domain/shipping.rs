use rand::Rng;

use super::money::{Money, MoneyError};
use crate::models::CartItem;

// ============================================================================
// Shipping - quotes and tracking IDs
// ============================================================================

pub const QUOTE_CURRENCY: &str = "USD";

/// `base + per_item * count`, where count is the total quantity across all
/// lines. The defaults reproduce the flat 8.99 USD fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteCalculator {
    pub base_fee_cents: i64,
    pub per_item_fee_cents: i64,
}

impl Default for QuoteCalculator {
    fn default() -> Self {
        Self {
            base_fee_cents: 899,
            per_item_fee_cents: 0,
        }
    }
}

impl QuoteCalculator {
    pub fn new(base_fee_cents: i64, per_item_fee_cents: i64) -> Self {
        Self {
            base_fee_cents,
            per_item_fee_cents,
        }
    }

    pub fn item_count(items: &[CartItem]) -> u32 {
        items
            .iter()
            .map(|item| item.quantity.max(0) as u32)
            .fold(0u32, u32::saturating_add)
    }

    pub fn quote(&self, items: &[CartItem]) -> Result<Money, MoneyError> {
        let base = Money::from_cents(QUOTE_CURRENCY, self.base_fee_cents);
        let per_item = Money::from_cents(QUOTE_CURRENCY, self.per_item_fee_cents);
        base.add(&per_item.multiply(Self::item_count(items))?)
    }
}

/// Produces shipment tracking IDs. No uniqueness guarantee.
pub trait TrackingIdGenerator: Send + Sync {
    fn generate(&self, salt: &str) -> String;
}

/// `LL-<len(salt)><3 digits>-<len(salt)/2><7 digits>`
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTrackingIds;

fn random_digits(rng: &mut impl Rng, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

impl TrackingIdGenerator for RandomTrackingIds {
    fn generate(&self, salt: &str) -> String {
        let mut rng = rand::thread_rng();
        let first = char::from(rng.gen_range(b'A'..=b'Z'));
        let second = char::from(rng.gen_range(b'A'..=b'Z'));

        format!(
            "{}{}-{}{}-{}{}",
            first,
            second,
            salt.len(),
            random_digits(&mut rng, 3),
            salt.len() / 2,
            random_digits(&mut rng, 7),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quote_is_flat() {
        let calc = QuoteCalculator::default();
        let one = calc.quote(&[CartItem::new("A", 1)]).unwrap();
        let many = calc.quote(&[CartItem::new("A", 3), CartItem::new("B", 2)]).unwrap();
        assert_eq!(one, Money::new("USD", 8, 990_000_000));
        assert_eq!(many, one);
        assert_eq!(calc.quote(&[]).unwrap(), one);
    }

    #[test]
    fn test_per_item_quote_counts_quantities() {
        let calc = QuoteCalculator::new(500, 150);
        let items = [CartItem::new("A", 3), CartItem::new("B", 1)];
        assert_eq!(QuoteCalculator::item_count(&items), 4);
        // 5.00 + 1.50 * 4
        assert_eq!(calc.quote(&items).unwrap(), Money::new("USD", 11, 0));
    }

    #[test]
    fn test_tracking_id_shape() {
        let salt = "1600 Amphitheatre Parkway, Mountain View, CA";
        let id = RandomTrackingIds.generate(salt);

        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3, "{id}");
        assert_eq!(parts[0].len(), 2);
        assert!(parts[0].chars().all(|c| c.is_ascii_uppercase()));

        let len = salt.len().to_string();
        assert!(parts[1].starts_with(&len));
        assert_eq!(parts[1].len(), len.len() + 3);

        let half = (salt.len() / 2).to_string();
        assert!(parts[2].starts_with(&half));
        assert_eq!(parts[2].len(), half.len() + 7);
        assert!(parts[1].chars().chain(parts[2].chars()).all(|c| c.is_ascii_digit()));
    }
}
