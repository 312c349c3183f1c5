// src/models/billing.rs

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::money::Price;

// Plano gratuito: quantos anúncios uma empresa pode ter sem assinatura.
pub const FREE_TIER_MAX_LISTINGS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    #[schema(example = "Pro")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "49.00")]
    pub price_amount: Decimal,
    #[schema(example = "USD")]
    pub price_currency: String,
    #[schema(example = 30)]
    pub duration_days: i32,
    #[schema(example = 100)]
    pub max_listings: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn price(&self) -> Price {
        Price::new(self.price_amount, &self.price_currency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_provider", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Stripe,
    Razorpay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Razorpay => "razorpay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub provider: PaymentProvider,
    #[schema(example = "pi_3Nk...")]
    pub provider_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    #[schema(example = "INV-2026-000042")]
    pub number: String,
    pub user_id: Uuid,
    pub payment_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

// Resposta do checkout: o que o cliente precisa para concluir no provedor.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment_id: Uuid,
    pub provider: PaymentProvider,
    pub provider_reference: String,
    /// `client_secret` do Stripe ou `order_id` do Razorpay
    pub client_token: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub plan: Option<SubscriptionPlan>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Calcula o período pago por uma renovação.
/// Renovar o mesmo plano ainda vigente soma a partir da validade atual;
/// a validade nunca anda para trás.
pub fn next_subscription_period(
    now: DateTime<Utc>,
    current_plan_id: Option<Uuid>,
    current_expiry: Option<DateTime<Utc>>,
    plan_id: Uuid,
    duration_days: i32,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let still_valid = current_expiry.filter(|exp| *exp > now);

    let start = match (current_plan_id, still_valid) {
        (Some(current), Some(exp)) if current == plan_id => exp,
        _ => now,
    };

    let end = start + Duration::days(i64::from(duration_days));
    let end = still_valid.map_or(end, |exp| end.max(exp));

    (start, end)
}

pub fn format_invoice_number(issued_at: DateTime<Utc>, sequence: i64) -> String {
    format!("INV-{}-{:06}", issued_at.year(), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscription_starts_now() {
        let now = Utc::now();
        let plan = Uuid::new_v4();
        let (start, end) = next_subscription_period(now, None, None, plan, 30);
        assert_eq!(start, now);
        assert_eq!(end, now + Duration::days(30));
    }

    #[test]
    fn renewing_the_same_plan_stacks_on_the_current_expiry() {
        let now = Utc::now();
        let plan = Uuid::new_v4();
        let expiry = now + Duration::days(10);
        let (start, end) = next_subscription_period(now, Some(plan), Some(expiry), plan, 30);
        assert_eq!(start, expiry);
        assert_eq!(end, expiry + Duration::days(30));
    }

    #[test]
    fn lapsed_subscription_restarts_from_now() {
        let now = Utc::now();
        let plan = Uuid::new_v4();
        let (start, _) =
            next_subscription_period(now, Some(plan), Some(now - Duration::days(3)), plan, 30);
        assert_eq!(start, now);
    }

    #[test]
    fn switching_plans_never_shortens_the_expiry() {
        let now = Utc::now();
        let yearly = Uuid::new_v4();
        let monthly = Uuid::new_v4();
        let expiry = now + Duration::days(200);
        let (_, end) = next_subscription_period(now, Some(yearly), Some(expiry), monthly, 30);
        assert_eq!(end, expiry);
    }

    #[test]
    fn invoice_numbers_are_zero_padded() {
        let issued = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_invoice_number(issued, 42), "INV-2026-000042");
    }
}
