// src/models/sourcing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::money::Price;

pub const DEFAULT_EXPIRY_DAYS: i64 = 30;
pub const MAX_EXPIRY_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sourcing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourcingStatus {
    Pending, // Aguardando aprovação do admin
    Active,  // Visível para os vendedores
    Closed,  // Rejeitado pelo admin ou encerrado pelo comprador
    Expired,
}

impl SourcingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourcingStatus::Pending => "pending",
            SourcingStatus::Active => "active",
            SourcingStatus::Closed => "closed",
            SourcingStatus::Expired => "expired",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SourcingStatus::Pending | SourcingStatus::Active)
    }

    pub fn can_transition_to(&self, next: SourcingStatus) -> bool {
        use SourcingStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Pending, Closed) | (Active, Closed) | (Pending, Expired) | (Active, Expired)
        )
    }
}

// --- Pedido de cotação ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourcingRequest {
    pub id: Uuid,
    pub buyer_id: Uuid,
    #[schema(example = "Caixas de papelão 40x30x20")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "embalagens")]
    pub category: String,
    #[schema(example = 20000)]
    pub quantity: i32,
    #[schema(example = "unidade")]
    pub unit: String,
    pub target_amount: Option<Decimal>,
    pub target_currency: Option<String>,
    pub status: SourcingStatus,
    pub rejection_reason: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SourcingRequest {
    /// O status que o leitor deve ver: um pedido aberto com prazo vencido está expirado,
    /// mesmo que o banco ainda não tenha sido atualizado.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SourcingStatus {
        if self.status.is_open() && self.expires_at <= now {
            SourcingStatus::Expired
        } else {
            self.status
        }
    }

    pub fn accepts_quotes(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == SourcingStatus::Active
    }

    /// Valida a transição a partir do status efetivo.
    pub fn check_transition(&self, next: SourcingStatus, now: DateTime<Utc>) -> Result<(), AppError> {
        let current = self.effective_status(now);
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        Ok(())
    }
}

// --- Cotação enviada por um vendedor ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourcingQuote {
    pub id: Uuid,
    pub request_id: Uuid,
    pub seller_id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "0.42")]
    pub price_amount: Decimal,
    #[schema(example = "EUR")]
    pub price_currency: String,
    pub quantity: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SourcingQuote {
    pub fn price(&self) -> Price {
        Price::new(self.price_amount, &self.price_currency)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: SourcingQuote,
    pub display_price: Option<Price>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(status: SourcingStatus, expires_in: Duration) -> SourcingRequest {
        let now = Utc::now();
        SourcingRequest {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            title: "Caixas".into(),
            description: None,
            category: "embalagens".into(),
            quantity: 100,
            unit: "un".into(),
            target_amount: None,
            target_currency: None,
            status,
            rejection_reason: None,
            expires_at: now + expires_in,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn open_requests_past_deadline_are_expired() {
        let now = Utc::now();
        let req = request(SourcingStatus::Active, Duration::seconds(-1));
        assert_eq!(req.effective_status(now), SourcingStatus::Expired);
        assert!(!req.accepts_quotes(now));
    }

    #[test]
    fn closed_requests_stay_closed_after_deadline() {
        let now = Utc::now();
        let req = request(SourcingStatus::Closed, Duration::days(-3));
        assert_eq!(req.effective_status(now), SourcingStatus::Closed);
    }

    #[test]
    fn only_active_requests_accept_quotes() {
        let now = Utc::now();
        assert!(request(SourcingStatus::Active, Duration::days(1)).accepts_quotes(now));
        assert!(!request(SourcingStatus::Pending, Duration::days(1)).accepts_quotes(now));
    }

    #[test]
    fn admin_cannot_approve_an_expired_request() {
        let now = Utc::now();
        let req = request(SourcingStatus::Pending, Duration::hours(-1));
        let err = req.check_transition(SourcingStatus::Active, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));
        assert!(request(SourcingStatus::Pending, Duration::hours(1))
            .check_transition(SourcingStatus::Active, now)
            .is_ok());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use SourcingStatus::*;
        for from in [Closed, Expired] {
            for to in [Pending, Active, Closed, Expired] {
                assert!(!from.can_transition_to(to));
            }
        }
    }
}
