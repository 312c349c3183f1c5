// src/models/money.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationError;

/// Um valor monetário com a moeda de origem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[schema(example = "1250.00")]
    pub base_amount: Decimal,
    #[schema(example = "USD")]
    pub base_currency: String,
}

impl Price {
    pub fn new(base_amount: Decimal, base_currency: &str) -> Self {
        Self { base_amount, base_currency: normalize_currency(base_currency) }
    }
}

/// `?currency=BRL`: moeda em que o cliente quer ver os preços.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_currency_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

// ---
// Validações reutilizadas pelos payloads
// ---
pub fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if !is_currency_code(code) {
        let mut err = ValidationError::new("currency");
        err.message = Some("validation.currency".into());
        return Err(err);
    }
    Ok(())
}

/// Maior valor que cabe em `NUMERIC(14, 2)`.
pub const MAX_MONEY_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Valor monetário gravável: não negativo, até `MAX_MONEY_AMOUNT` e no máximo 2 casas.
pub fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("validation.not_negative".into());
        return Err(err);
    }
    if *val > MAX_MONEY_AMOUNT {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.money_too_large".into());
        return Err(err);
    }
    if val.normalize().scale() > 2 {
        let mut err = ValidationError::new("scale");
        err.message = Some("validation.money_scale".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn currency_codes_are_three_letters() {
        assert!(is_currency_code("usd"));
        assert!(is_currency_code(" BRL "));
        assert!(!is_currency_code("US"));
        assert!(!is_currency_code("US1"));
        assert!(!is_currency_code("EURO"));
    }

    #[test]
    fn price_normalizes_its_currency() {
        let price = Price::new(Decimal::new(1000, 2), " inr");
        assert_eq!(price.base_currency, "INR");
    }

    fn rejection(val: Decimal) -> Option<String> {
        validate_money(&val).err().and_then(|e| e.message).map(|m| m.into_owned())
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert_eq!(rejection(Decimal::new(-1, 0)).as_deref(), Some("validation.not_negative"));
        assert!(validate_money(&Decimal::ZERO).is_ok());
        assert!(validate_money(&Decimal::new(5, 1)).is_ok());
    }

    #[test]
    fn money_fits_the_stored_column() {
        assert_eq!(MAX_MONEY_AMOUNT, Decimal::from_str("999999999999.99").unwrap());
        assert!(validate_money(&MAX_MONEY_AMOUNT).is_ok());
        assert_eq!(
            rejection(Decimal::from_str("1000000000000").unwrap()).as_deref(),
            Some("validation.money_too_large")
        );
        assert_eq!(rejection(Decimal::MAX).as_deref(), Some("validation.money_too_large"));
    }

    #[test]
    fn money_has_at_most_two_decimal_places() {
        assert!(validate_money(&Decimal::from_str("12.50").unwrap()).is_ok());
        assert!(validate_money(&Decimal::from_str("12.5000").unwrap()).is_ok());
        assert_eq!(rejection(Decimal::from_str("0.001").unwrap()).as_deref(), Some("validation.money_scale"));
    }
}
