// src/models/offer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "offer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

/// A resposta do comprador a uma oferta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferDecision {
    Accept,
    Decline,
}

impl OfferDecision {
    pub fn target_status(self) -> OfferStatus {
        match self {
            OfferDecision::Accept => OfferStatus::Accepted,
            OfferDecision::Decline => OfferStatus::Declined,
        }
    }
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OfferStatus::Pending)
    }

    /// Só `pending` muda, e só uma vez. Aceita/recusada são imutáveis.
    pub fn transition(self, decision: OfferDecision) -> Result<OfferStatus, AppError> {
        let next = decision.target_status();
        if self.is_terminal() {
            return Err(AppError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        Ok(next)
    }
}

// --- Oferta formal ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub product_id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = 1000)]
    pub quantity: i32,
    #[schema(example = "0.31")]
    pub price_amount: Decimal,
    #[schema(example = "USD")]
    pub price_currency: String,
    pub notes: Option<String>,
    pub status: OfferStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn total(&self) -> Decimal {
        self.price_amount * Decimal::from(self.quantity)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_offer_can_be_accepted_or_declined() {
        assert_eq!(OfferStatus::Pending.transition(OfferDecision::Accept).unwrap(), OfferStatus::Accepted);
        assert_eq!(OfferStatus::Pending.transition(OfferDecision::Decline).unwrap(), OfferStatus::Declined);
    }

    #[test]
    fn terminal_offers_never_change_again() {
        for status in [OfferStatus::Accepted, OfferStatus::Declined] {
            for decision in [OfferDecision::Accept, OfferDecision::Decline] {
                let err = status.transition(decision).unwrap_err();
                assert!(matches!(err, AppError::InvalidStateTransition { .. }));
            }
        }
    }
}
