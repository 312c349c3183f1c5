// src/services/payment_gateway.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use uuid::Uuid;

use crate::{common::error::AppError, models::money::Price};

const STRIPE_API_URL: &str = "https://api.stripe.com/v1/payment_intents";
const RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1/orders";

/// Pagamento criado do lado do provedor, ainda não confirmado.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    /// `pi_...` (Stripe) ou `order_...` (Razorpay). É a chave do webhook.
    pub reference: String,
    /// O que o front precisa para concluir: client_secret ou o id da order.
    pub client_token: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(
        &self,
        price: &Price,
        payment_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProviderPayment, AppError>;
}

// Moedas sem casas decimais nos provedores (o valor já é a unidade mínima).
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

const THREE_DECIMAL_CURRENCIES: &[&str] = &["BHD", "JOD", "KWD", "OMR", "TND"];

/// Casas decimais da unidade mínima de `currency` (ISO 4217).
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let code = currency.trim().to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        0
    } else if THREE_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// Valor em unidades mínimas da moeda (centavos, paise; ienes inteiros).
pub fn to_minor_units(amount: Decimal, currency: &str) -> Result<i64, AppError> {
    let out_of_range = || AppError::PaymentProvider(format!("valor fora do intervalo: {} {}", amount, currency));

    let factor = 10_i64.pow(minor_unit_exponent(currency));
    amount
        .checked_mul(Decimal::from(factor))
        .ok_or_else(out_of_range)?
        .round()
        .to_i64()
        .ok_or_else(out_of_range)
}

fn http_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| AppError::InternalServerError(e.into()))
}

async fn read_provider_response<T: for<'de> Deserialize<'de>>(
    provider: &str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(AppError::PaymentProvider(format!("{} {}: {}", provider, status, error_text)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::PaymentProvider(format!("{}: resposta ilegível: {}", provider, e)))
}

// ---
// Stripe (PaymentIntent, form-encoded)
// ---

pub struct StripeGateway {
    client: Client,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Result<Self, AppError> {
        Ok(Self { client: http_client()?, secret_key })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment(
        &self,
        price: &Price,
        payment_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProviderPayment, AppError> {
        let form = [
            ("amount", to_minor_units(price.base_amount, &price.base_currency)?.to_string()),
            ("currency", price.base_currency.to_ascii_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[payment_id]", payment_id.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .client
            .post(STRIPE_API_URL)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", payment_id.to_string())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("stripe: {}", e)))?;

        let intent: StripePaymentIntent = read_provider_response("stripe", response).await?;

        Ok(ProviderPayment { reference: intent.id, client_token: intent.client_secret })
    }
}

// ---
// Razorpay (Order, JSON + basic auth)
// ---

pub struct RazorpayGateway {
    client: Client,
    key_id: String,
    key_secret: String,
}

#[derive(Deserialize)]
struct RazorpayOrder {
    id: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Result<Self, AppError> {
        Ok(Self { client: http_client()?, key_id, key_secret })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_payment(
        &self,
        price: &Price,
        payment_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProviderPayment, AppError> {
        let body = serde_json::json!({
            "amount": to_minor_units(price.base_amount, &price.base_currency)?,
            "currency": price.base_currency.as_str(),
            "receipt": payment_id.to_string(),
            "notes": { "payment_id": payment_id, "user_id": user_id },
        });

        let response = self
            .client
            .post(RAZORPAY_API_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("razorpay: {}", e)))?;

        let order: RazorpayOrder = read_provider_response("razorpay", response).await?;

        Ok(ProviderPayment { client_token: order.id.clone(), reference: order.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_round_half_cents() {
        assert_eq!(to_minor_units(Decimal::from_str("49.99").unwrap(), "USD").unwrap(), 4999);
        assert_eq!(to_minor_units(Decimal::from_str("10").unwrap(), "inr").unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::from_str("0.005").unwrap(), "EUR").unwrap(), 0);
    }

    #[test]
    fn zero_decimal_currencies_are_sent_as_whole_units() {
        assert_eq!(minor_unit_exponent("JPY"), 0);
        assert_eq!(minor_unit_exponent(" krw "), 0);
        assert_eq!(to_minor_units(Decimal::from_str("1500").unwrap(), "JPY").unwrap(), 1500);
        assert_eq!(to_minor_units(Decimal::from_str("49000").unwrap(), "vnd").unwrap(), 49000);
        assert_eq!(to_minor_units(Decimal::from_str("990.40").unwrap(), "CLP").unwrap(), 990);
    }

    #[test]
    fn three_decimal_currencies_use_thousandths() {
        assert_eq!(minor_unit_exponent("KWD"), 3);
        assert_eq!(to_minor_units(Decimal::from_str("12.35").unwrap(), "KWD").unwrap(), 12350);
        assert_eq!(minor_unit_exponent("BRL"), 2);
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        assert!(matches!(to_minor_units(Decimal::MAX, "USD"), Err(AppError::PaymentProvider(_))));
        assert!(matches!(
            to_minor_units(Decimal::from_str("99999999999999999999").unwrap(), "JPY"),
            Err(AppError::PaymentProvider(_))
        ));
    }
}
