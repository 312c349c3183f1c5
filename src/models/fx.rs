// src/models/fx.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Quantas unidades da moeda compram 1 USD.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    #[schema(example = "BRL")]
    pub currency: String,
    #[schema(example = "5.4321")]
    pub rate_per_usd: Decimal,
    pub updated_at: DateTime<Utc>,
}
