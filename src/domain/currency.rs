use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::errors::ServiceError;
use super::money::{carry, Money};

// ============================================================================
// Currency Conversion
// ============================================================================
//
// Rates are expressed relative to the pivot currency (EUR = 1.0). A
// conversion A -> B goes A -> EUR -> B using f64 arithmetic, truncating to
// integer nanos after each hop.
//
// Round trips are lossy: convert(convert(x, B), A) differs from x by at most
// 2 + ceil(rate_A / rate_B) nanos. That is accepted behavior.
//
// ============================================================================

pub const PIVOT_CURRENCY: &str = "EUR";

#[derive(Deserialize)]
#[serde(untagged)]
enum RateValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    /// Parse `{"EUR": "1.0", "USD": "1.1305", ...}`. Values may also be bare
    /// numbers.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: HashMap<String, RateValue> =
            serde_json::from_slice(data).context("invalid currency conversion JSON")?;

        let mut rates = HashMap::with_capacity(raw.len());
        for (code, value) in raw {
            let rate = match value {
                RateValue::Number(n) => n,
                RateValue::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid rate for {code}: {s:?}"))?,
            };
            if !rate.is_finite() || rate <= 0.0 {
                anyhow::bail!("rate for {code} must be positive, got {rate}");
            }
            rates.insert(code, rate);
        }

        if !rates.contains_key(PIVOT_CURRENCY) {
            anyhow::bail!("conversion table has no {PIVOT_CURRENCY} pivot entry");
        }

        Ok(Self { rates })
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&data)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Supported currency codes in alphabetical order.
    pub fn supported_currencies(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    fn rate(&self, code: &str) -> Result<f64, ServiceError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| ServiceError::UnsupportedCurrency(code.to_string()))
    }

    pub fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError> {
        let from_rate = self.rate(&from.currency_code)?;
        let to_rate = self.rate(to_code)?;

        let euros = carry(
            PIVOT_CURRENCY,
            from.units as f64 / from_rate,
            from.nanos as f64 / from_rate,
        )?;

        let converted = carry(
            to_code,
            euros.units as f64 * to_rate,
            euros.nanos as f64 * to_rate,
        )?;

        Ok(converted)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"EUR": "1.0", "USD": "1.1305", "JPY": 126.40, "GBP": "0.85970"}"#;

    fn rates() -> ExchangeRates {
        ExchangeRates::from_json(SAMPLE.as_bytes()).unwrap()
    }

    fn nanos(m: &Money) -> i128 {
        m.units as i128 * 1_000_000_000 + m.nanos as i128
    }

    #[test]
    fn test_parse_rates() {
        let rates = rates();
        assert_eq!(rates.len(), 4);
        assert_eq!(rates.supported_currencies(), vec!["EUR", "GBP", "JPY", "USD"]);
    }

    #[test]
    fn test_parse_rejects_missing_pivot_and_bad_values() {
        assert!(ExchangeRates::from_json(br#"{"USD": "1.1"}"#).is_err());
        assert!(ExchangeRates::from_json(br#"{"EUR": "1.0", "USD": "abc"}"#).is_err());
        assert!(ExchangeRates::from_json(br#"{"EUR": "0"}"#).is_err());
    }

    fn assert_close(m: &Money, code: &str, expected_nanos: i128) {
        assert_eq!(m.currency_code, code);
        assert!(m.is_normalized(), "{m:?}");
        let diff = (nanos(m) - expected_nanos).abs();
        assert!(diff <= 2, "{m:?} differs from {expected_nanos} by {diff}");
    }

    #[test]
    fn test_convert_to_pivot() {
        let eur = rates().convert(&Money::new("USD", 11, 305_000_000), "EUR").unwrap();
        assert_close(&eur, "EUR", 10_000_000_000);
    }

    #[test]
    fn test_convert_from_pivot() {
        let jpy = rates().convert(&Money::new("EUR", 2, 500_000_000), "JPY").unwrap();
        assert_close(&jpy, "JPY", 316_000_000_000);
    }

    #[test]
    fn test_unsupported_currency() {
        let rates = rates();
        assert!(matches!(
            rates.convert(&Money::new("XXX", 1, 0), "USD"),
            Err(ServiceError::UnsupportedCurrency(code)) if code == "XXX"
        ));
        assert!(matches!(
            rates.convert(&Money::new("USD", 1, 0), "ZZZ"),
            Err(ServiceError::UnsupportedCurrency(code)) if code == "ZZZ"
        ));
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let rates = rates();
        let amounts = [
            Money::new("USD", 19, 990_000_000),
            Money::new("USD", 0, 1),
            Money::new("USD", 1234, 567_890_123),
            Money::new("USD", -42, -500_000_000),
        ];
        // 2 + ceil(1.1305 / 1.0)
        let tolerance = 4;

        for original in amounts {
            let eur = rates.convert(&original, "EUR").unwrap();
            let back = rates.convert(&eur, "USD").unwrap();
            assert_eq!(back.currency_code, "USD");
            assert!(back.is_normalized());
            let diff = (nanos(&back) - nanos(&original)).abs();
            assert!(diff <= tolerance, "{original:?} -> {back:?} (diff {diff})");
        }
    }
}
