// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::money::Price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_status", rename_all = "snake_case")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum ProductStatus {
    PendingReview, // Vira "pending_review"
    Active,
    Rejected,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::PendingReview => "pending_review",
            ProductStatus::Active => "active",
            ProductStatus::Rejected => "rejected",
            ProductStatus::Archived => "archived",
        }
    }

    /// Moderação: pendente vira ativo ou rejeitado; qualquer um pode ser arquivado.
    /// Arquivado é final.
    pub fn can_transition_to(&self, next: ProductStatus) -> bool {
        use ProductStatus::*;
        matches!(
            (self, next),
            (PendingReview, Active)
                | (PendingReview, Rejected)
                | (PendingReview, Archived)
                | (Active, Rejected)
                | (Active, Archived)
                | (Rejected, Archived)
        )
    }
}

// --- Anúncio ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub seller_id: Uuid,
    #[schema(example = "Parafuso sextavado M8 inox")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "fixadores")]
    pub category: String,
    #[schema(example = "0.35")]
    pub base_amount: Decimal,
    #[schema(example = "USD")]
    pub base_currency: String,
    #[schema(example = 500)]
    pub min_order_quantity: i32,
    #[schema(example = "peça")]
    pub unit: String,
    pub status: ProductStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn price(&self) -> Price {
        Price::new(self.base_amount, &self.base_currency)
    }
}

// O que a vitrine devolve: o anúncio + o preço convertido (se pedido).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: Option<Price>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category: Option<String>,
    /// Busca por texto no nome/descrição
    pub q: Option<String>,
    /// Moeda para exibir o preço convertido
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProductStatus::*;

    #[test]
    fn archived_is_final() {
        for next in [PendingReview, Active, Rejected, Archived] {
            assert!(!Archived.can_transition_to(next));
        }
    }

    #[test]
    fn moderation_moves_pending_products() {
        assert!(PendingReview.can_transition_to(Active));
        assert!(PendingReview.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Active));
        assert!(!Active.can_transition_to(PendingReview));
    }
}
