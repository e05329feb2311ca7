use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Money - fixed-point currency amount
// ============================================================================
//
// An amount is whole `units` plus fractional `nanos` (10^-9 units). All
// arithmetic goes through a single i128 nano count, so results are always
// normalized: |nanos| < 1e9 and units/nanos carry the same sign. Division
// truncates toward zero.
//
// ============================================================================

pub const NANOS_PER_UNIT: i64 = 1_000_000_000;
const NANOS_MOD: i128 = NANOS_PER_UNIT as i128;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MoneyError {
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("amount overflows the representable range")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    #[serde(alias = "currency_code")]
    pub currency_code: String,
    #[serde(default)]
    pub units: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Self {
        Self {
            currency_code: currency_code.into(),
            units,
            nanos,
        }
    }

    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(currency_code, 0, 0)
    }

    /// Builds an amount from a whole number of cents (1/100 of a unit).
    pub fn from_cents(currency_code: impl Into<String>, cents: i64) -> Self {
        let units = cents / 100;
        let nanos = ((cents % 100) * 10_000_000) as i32;
        Self::new(currency_code, units, nanos)
    }

    /// Total value in nanos. Never overflows: i64 units * 1e9 fits in i128.
    fn total_nanos(&self) -> i128 {
        self.units as i128 * NANOS_MOD + self.nanos as i128
    }

    fn from_total_nanos(currency_code: String, total: i128) -> Result<Self, MoneyError> {
        let units = i64::try_from(total / NANOS_MOD).map_err(|_| MoneyError::Overflow)?;
        // |total % 1e9| < 1e9 always fits an i32
        let nanos = (total % NANOS_MOD) as i32;
        Ok(Self {
            currency_code,
            units,
            nanos,
        })
    }

    /// Whether nanos are in range and sign-consistent with units.
    pub fn is_normalized(&self) -> bool {
        let in_range = (self.nanos as i64).abs() < NANOS_PER_UNIT;
        let sign_ok = (self.units >= 0 && self.nanos >= 0) || (self.units <= 0 && self.nanos <= 0);
        in_range && sign_ok
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.nanos == 0
    }

    pub fn is_negative(&self) -> bool {
        self.total_nanos() < 0
    }

    /// Re-express the same value in normalized form.
    pub fn normalized(&self) -> Result<Self, MoneyError> {
        Self::from_total_nanos(self.currency_code.clone(), self.total_nanos())
    }

    /// Sum of two amounts of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            });
        }
        Self::from_total_nanos(
            self.currency_code.clone(),
            self.total_nanos() + other.total_nanos(),
        )
    }

    /// Scale by an unsigned factor (e.g. a line-item quantity).
    pub fn multiply(&self, factor: u32) -> Result<Money, MoneyError> {
        Self::from_total_nanos(
            self.currency_code.clone(),
            self.total_nanos() * factor as i128,
        )
    }

    /// `units.cc` with the fractional part truncated to cents.
    pub fn format_major_minor(&self) -> String {
        let cents = (self.nanos as i64 / 10_000_000).abs();
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.units.abs(), cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format_major_minor(), self.currency_code)
    }
}

/// Float carry used by currency conversion.
///
/// Moves the fractional part of `units` into `nanos`, then the whole part of
/// `nanos` back into `units`. The result is truncated to integer nanos and
/// normalized, so the sign of units and nanos always agree.
pub fn carry(currency_code: &str, units: f64, nanos: f64) -> Result<Money, MoneyError> {
    let fraction = NANOS_PER_UNIT as f64;
    let nanos = nanos + units.fract() * fraction;
    let units = units.trunc() + (nanos / fraction).trunc();
    let nanos = nanos % fraction;

    if !units.is_finite() || units.abs() >= i64::MAX as f64 {
        return Err(MoneyError::Overflow);
    }

    Money::new(currency_code, units as i64, nanos as i32).normalized()
}

/// Display symbol for the currencies the storefront knows about.
pub fn currency_symbol(currency_code: &str) -> &'static str {
    match currency_code {
        "USD" | "CAD" => "$",
        "JPY" => "¥",
        "EUR" => "€",
        "TRY" => "₺",
        "GBP" => "£",
        _ => "$",
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(units: i64, nanos: i32) -> Money {
        Money::new("USD", units, nanos)
    }

    #[test]
    fn test_add_carries_nanos_into_units() {
        let sum = usd(1, 600_000_000).add(&usd(2, 700_000_000)).unwrap();
        assert_eq!(sum, usd(4, 300_000_000));
    }

    #[test]
    fn test_add_mixed_signs_stays_sign_consistent() {
        let sum = usd(5, 0).add(&usd(-7, -500_000_000)).unwrap();
        assert_eq!(sum, usd(-2, -500_000_000));
        assert!(sum.is_normalized());

        let sum = usd(-1, -200_000_000).add(&usd(3, 0)).unwrap();
        assert_eq!(sum, usd(1, 800_000_000));
    }

    #[test]
    fn test_add_rejects_currency_mismatch() {
        let err = usd(1, 0).add(&Money::new("EUR", 1, 0)).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                left: "USD".to_string(),
                right: "EUR".to_string(),
            }
        );
    }

    #[test]
    fn test_unnormalized_inputs_are_normalized() {
        let inputs = [
            (0, 2_000_000_000),
            (3, 1_999_999_999),
            (-3, -1_000_000_000),
            (1, -1_500_000_000),
            (-2, 1_200_000_000),
            (0, i32::MAX),
            (0, i32::MIN),
        ];

        for (units, nanos) in inputs {
            let raw = usd(units, nanos);
            for result in [raw.add(&usd(0, 0)).unwrap(), raw.multiply(3).unwrap()] {
                assert!((result.nanos as i64).abs() < NANOS_PER_UNIT, "{result:?}");
                if result.units != 0 && result.nanos != 0 {
                    assert_eq!(result.units.signum(), result.nanos.signum() as i64, "{result:?}");
                }
            }
        }
    }

    #[test]
    fn test_whole_units_carried_out_of_nanos() {
        assert_eq!(usd(0, 2_000_000_000).add(&usd(0, 0)).unwrap(), usd(2, 0));
        assert_eq!(usd(1, -2_000_000_000).add(&usd(0, 0)).unwrap(), usd(-1, 0));
    }

    #[test]
    fn test_multiply() {
        assert_eq!(usd(10, 0).multiply(2).unwrap(), usd(20, 0));
        assert_eq!(usd(0, 750_000_000).multiply(3).unwrap(), usd(2, 250_000_000));
        assert_eq!(usd(-1, -500_000_000).multiply(2).unwrap(), usd(-3, 0));
        assert_eq!(usd(9, 990_000_000).multiply(0).unwrap(), usd(0, 0));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = usd(i64::MAX, 0).add(&usd(1, 0)).unwrap_err();
        assert_eq!(err, MoneyError::Overflow);
        assert_eq!(usd(i64::MAX / 2 + 1, 0).multiply(2), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_carry() {
        let m = carry("EUR", 1.5, 250_000_000.0).unwrap();
        assert_eq!(m, Money::new("EUR", 1, 750_000_000));

        let m = carry("EUR", 2.0, 1_500_000_000.0).unwrap();
        assert_eq!(m, Money::new("EUR", 3, 500_000_000));

        let m = carry("EUR", -1.25, 0.0).unwrap();
        assert_eq!(m, Money::new("EUR", -1, -250_000_000));
    }

    #[test]
    fn test_from_cents_and_formatting() {
        let m = Money::from_cents("USD", 899);
        assert_eq!(m, usd(8, 990_000_000));
        assert_eq!(m.format_major_minor(), "8.99");
        assert_eq!(m.to_string(), "8.99 USD");
        assert_eq!(usd(-3, -50_000_000).format_major_minor(), "-3.05");
    }

    #[test]
    fn test_serde_accepts_catalog_and_snake_case() {
        let m: Money =
            serde_json::from_str(r#"{"currencyCode":"USD","units":19,"nanos":990000000}"#).unwrap();
        assert_eq!(m, usd(19, 990_000_000));

        let m: Money = serde_json::from_str(r#"{"currency_code":"EUR","units":5}"#).unwrap();
        assert_eq!(m, Money::new("EUR", 5, 0));
    }
}
