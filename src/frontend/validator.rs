use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::domain::ServiceError;
use crate::models::{Address, CreditCard};

// ============================================================================
// Form Validation
// ============================================================================
//
// Forms arrive as strings so that malformed numbers surface as validation
// errors (422) instead of extractor rejections. All problems in one form are
// reported together.
//
// ============================================================================

pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddToCart {
    pub product_id: String,
    pub quantity: u32,
}

impl AddToCartForm {
    pub fn validate(&self) -> Result<AddToCart, ServiceError> {
        let mut problems = Vec::new();

        let product_id = self.product_id.trim();
        if product_id.is_empty() {
            problems.push("product_id is required".to_string());
        }

        let quantity = match self.quantity.trim().parse::<u32>() {
            Ok(q) if (MIN_QUANTITY..=MAX_QUANTITY).contains(&q) => q,
            Ok(q) => {
                problems.push(format!(
                    "quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {q}"
                ));
                0
            }
            Err(_) => {
                problems.push("quantity must be a whole number".to_string());
                0
            }
        };

        finish(problems)?;
        Ok(AddToCart {
            product_id: product_id.to_string(),
            quantity,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderForm {
    pub email: String,
    pub user_id: Option<String>,
    pub street_address: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub credit_card_number: String,
    pub credit_card_expiration_month: String,
    pub credit_card_expiration_year: String,
    pub credit_card_cvv: String,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderPayload {
    pub email: String,
    pub address: Address,
    pub credit_card: CreditCard,
}

fn required(problems: &mut Vec<String>, name: &str, value: &str, max_len: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        problems.push(format!("{name} is required"));
    } else if value.chars().count() > max_len {
        problems.push(format!("{name} must be at most {max_len} characters"));
    }
    value.to_string()
}

fn number(problems: &mut Vec<String>, name: &str, value: &str) -> i32 {
    value.trim().parse::<i32>().unwrap_or_else(|_| {
        problems.push(format!("{name} must be a number"));
        0
    })
}

fn finish(problems: Vec<String>) -> Result<(), ServiceError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(problems.join("; ")))
    }
}

impl PlaceOrderForm {
    /// Checks shape only. Card checksum and expiry are the payment service's call,
    /// except that an expiration year in the past is rejected here already.
    pub fn validate(&self, today: NaiveDate) -> Result<PlaceOrderPayload, ServiceError> {
        let mut problems = Vec::new();

        let email = required(&mut problems, "email", &self.email, 320);
        if !email.is_empty() && !email.contains('@') {
            problems.push("email must be a valid address".to_string());
        }

        let street_address = required(&mut problems, "street_address", &self.street_address, 512);
        let city = required(&mut problems, "city", &self.city, 128);
        let state = required(&mut problems, "state", &self.state, 128);
        let country = required(&mut problems, "country", &self.country, 128);

        let zip_code = number(&mut problems, "zip_code", &self.zip_code);
        if zip_code < 0 {
            problems.push("zip_code must not be negative".to_string());
        }

        let card_number: String = self
            .credit_card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if card_number.is_empty() {
            problems.push("credit_card_number is required".to_string());
        } else if !card_number.chars().all(|c| c.is_ascii_digit()) {
            problems.push("credit_card_number must contain only digits".to_string());
        }

        let month = number(&mut problems, "credit_card_expiration_month", &self.credit_card_expiration_month);
        if !(1..=12).contains(&month) {
            problems.push("credit_card_expiration_month must be between 1 and 12".to_string());
        }

        let year = number(&mut problems, "credit_card_expiration_year", &self.credit_card_expiration_year);
        if year < today.year() {
            problems.push("credit_card_expiration_year is in the past".to_string());
        }

        let cvv_raw = self.credit_card_cvv.trim();
        if !(3..=4).contains(&cvv_raw.len()) || !cvv_raw.chars().all(|c| c.is_ascii_digit()) {
            problems.push("credit_card_cvv must be 3 or 4 digits".to_string());
        }
        let cvv = cvv_raw.parse::<i32>().unwrap_or(0);

        finish(problems)?;
        Ok(PlaceOrderPayload {
            email,
            address: Address {
                street_address,
                city,
                state,
                country,
                zip_code,
            },
            credit_card: CreditCard {
                number: card_number,
                cvv,
                expiration_year: year,
                expiration_month: month,
            },
        })
    }
}
