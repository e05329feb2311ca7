use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use super::errors::ServiceError;
use super::money::Money;
use crate::models::CreditCard;

// ============================================================================
// Payment - card validation and mock charging
// ============================================================================
//
// Nothing is charged. A card that passes validation yields a fresh UUID
// transaction ID.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PaymentError {
    #[error("credit card number must contain only digits")]
    InvalidCharacters,

    #[error("credit card number must have 13 to 19 digits, got {0}")]
    InvalidLength(usize),

    #[error("credit card number failed the checksum")]
    InvalidChecksum,

    #[error("sorry, we cannot process {0} credit cards, only VISA or MasterCard is accepted")]
    UnsupportedCardType(CardType),

    #[error("the credit card (ending {last_four}) expired on {month:02}/{year}")]
    Expired {
        last_four: String,
        month: i32,
        year: i32,
    },

    #[error("invalid expiration month {0}")]
    InvalidMonth(i32),

    #[error("charge amount must not be negative: {0}")]
    NegativeAmount(Money),
}

impl From<PaymentError> for ServiceError {
    fn from(err: PaymentError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    MasterCard,
    AmericanExpress,
    Discover,
    Unknown,
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardType::Visa => "VISA",
            CardType::MasterCard => "MasterCard",
            CardType::AmericanExpress => "American Express",
            CardType::Discover => "Discover",
            CardType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Issuer from the leading digits. Expects a digits-only number.
pub fn card_type(number: &str) -> CardType {
    let prefix = |len: usize| number.get(..len).and_then(|p| p.parse::<u32>().ok());

    match (prefix(1), prefix(2), prefix(4)) {
        (Some(4), _, _) => CardType::Visa,
        (_, Some(51..=55), _) | (_, _, Some(2221..=2720)) => CardType::MasterCard,
        (_, Some(34 | 37), _) => CardType::AmericanExpress,
        (_, Some(65), _) | (_, _, Some(6011)) => CardType::Discover,
        _ => CardType::Unknown,
    }
}

pub fn luhn_valid(number: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

/// Checks the card against the month containing `today`.
pub fn validate_card(card: &CreditCard, today: NaiveDate) -> Result<CardType, PaymentError> {
    let number = card.number.as_str();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidCharacters);
    }
    if !(13..=19).contains(&number.len()) {
        return Err(PaymentError::InvalidLength(number.len()));
    }
    if !luhn_valid(number) {
        return Err(PaymentError::InvalidChecksum);
    }

    let kind = card_type(number);
    if !matches!(kind, CardType::Visa | CardType::MasterCard) {
        return Err(PaymentError::UnsupportedCardType(kind));
    }

    if !(1..=12).contains(&card.expiration_month) {
        return Err(PaymentError::InvalidMonth(card.expiration_month));
    }
    let current = today.year() * 12 + today.month() as i32;
    let expiry = card.expiration_year * 12 + card.expiration_month;
    if expiry < current {
        return Err(PaymentError::Expired {
            last_four: card.last_four().to_string(),
            month: card.expiration_month,
            year: card.expiration_year,
        });
    }

    Ok(kind)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PaymentProcessor;

impl PaymentProcessor {
    pub fn charge(&self, amount: &Money, card: &CreditCard) -> Result<String, PaymentError> {
        self.charge_on(amount, card, Utc::now().date_naive())
    }

    pub fn charge_on(
        &self,
        amount: &Money,
        card: &CreditCard,
        today: NaiveDate,
    ) -> Result<String, PaymentError> {
        if amount.is_negative() {
            return Err(PaymentError::NegativeAmount(amount.clone()));
        }

        let kind = validate_card(card, today)?;
        let transaction_id = Uuid::new_v4().to_string();

        tracing::info!(
            card_type = %kind,
            card = %card,
            amount = %amount,
            transaction_id = %transaction_id,
            "Transaction processed"
        );
        Ok(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, year: i32, month: i32) -> CreditCard {
        CreditCard {
            number: number.to_string(),
            cvv: 123,
            expiration_year: year,
            expiration_month: month,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    #[test]
    fn test_card_types() {
        assert_eq!(card_type("4432801561520454"), CardType::Visa);
        assert_eq!(card_type("5555555555554444"), CardType::MasterCard);
        assert_eq!(card_type("2223003122003222"), CardType::MasterCard);
        assert_eq!(card_type("378282246310005"), CardType::AmericanExpress);
        assert_eq!(card_type("6011111111111117"), CardType::Discover);
        assert_eq!(card_type("9999999999999995"), CardType::Unknown);
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111111111111111"));
        assert!(!luhn_valid("4111111111111112"));
        assert!(!luhn_valid("41111x1111111111"));
    }

    #[test]
    fn test_valid_card_is_charged() {
        let id = PaymentProcessor
            .charge_on(
                &Money::new("USD", 33, 990_000_000),
                &card("4432801561520454", 2030, 1),
                today(),
            )
            .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (card("4432-8015-6152-0454", 2030, 1), "only digits"),
            (card("4111111", 2030, 1), "13 to 19"),
            (card("4111111111111112", 2030, 1), "checksum"),
            (card("378282246310005", 2030, 1), "American Express"),
            (card("4111111111111111", 2026, 5), "expired on 05/2026"),
            (card("4111111111111111", 2030, 13), "month 13"),
        ];

        for (card, expected) in cases {
            let err = validate_card(&card, today()).unwrap_err();
            assert!(err.to_string().contains(expected), "{err} vs {expected}");
        }
    }

    #[test]
    fn test_card_expiring_this_month_is_accepted() {
        assert_eq!(
            validate_card(&card("5555555555554444", 2026, 6), today()),
            Ok(CardType::MasterCard)
        );
    }

    #[test]
    fn test_payment_error_maps_to_validation() {
        let err: ServiceError = PaymentError::InvalidChecksum.into();
        assert_eq!(err.into_status().code(), tonic::Code::InvalidArgument);

        let negative = PaymentProcessor.charge_on(
            &Money::new("USD", -1, 0),
            &card("4111111111111111", 2030, 1),
            today(),
        );
        assert!(matches!(negative, Err(PaymentError::NegativeAmount(_))));
    }
}
