// src/db/fx_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::fx::ExchangeRate};

#[derive(Clone)]
pub struct FxRepository {
    pool: PgPool,
}

impl FxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_rates(&self) -> Result<Vec<ExchangeRate>, AppError> {
        let rates = sqlx::query_as::<_, ExchangeRate>(
            "SELECT currency, rate_per_usd, updated_at FROM exchange_rates ORDER BY currency",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    pub async fn upsert_rate<'e, E>(
        &self,
        executor: E,
        currency: &str,
        rate_per_usd: Decimal,
    ) -> Result<ExchangeRate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rate = sqlx::query_as::<_, ExchangeRate>(
            r#"
            INSERT INTO exchange_rates (currency, rate_per_usd)
            VALUES ($1, $2)
            ON CONFLICT (currency)
            DO UPDATE SET rate_per_usd = EXCLUDED.rate_per_usd, updated_at = NOW()
            RETURNING currency, rate_per_usd, updated_at
            "#,
        )
        .bind(currency)
        .bind(rate_per_usd)
        .fetch_one(executor)
        .await?;

        Ok(rate)
    }
}
