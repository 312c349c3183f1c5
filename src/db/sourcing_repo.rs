// src/db/sourcing_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sourcing::{SourcingQuote, SourcingRequest, SourcingStatus},
};

#[derive(Clone)]
pub struct SourcingRepository {
    pool: PgPool,
}

impl SourcingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    pub async fn create_request<'e, E>(
        &self,
        executor: E,
        buyer_id: Uuid,
        title: &str,
        description: Option<&str>,
        category: &str,
        quantity: i32,
        unit: &str,
        target_amount: Option<Decimal>,
        target_currency: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<SourcingRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SourcingRequest>(
            r#"
            INSERT INTO sourcing_requests (
                buyer_id, title, description, category, quantity, unit,
                target_amount, target_currency, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(buyer_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(quantity)
        .bind(unit)
        .bind(target_amount)
        .bind(target_currency)
        .bind(expires_at)
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    pub async fn find_request<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SourcingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SourcingRequest>(
            "SELECT * FROM sourcing_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    /// Persiste a expiração de todos os pedidos abertos com prazo vencido.
    pub async fn expire_overdue<'e, E>(&self, executor: E, now: DateTime<Utc>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE sourcing_requests
            SET status = 'expired', updated_at = NOW()
            WHERE status IN ('pending', 'active') AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_by_status(&self, status: SourcingStatus) -> Result<Vec<SourcingRequest>, AppError> {
        let requests = sqlx::query_as::<_, SourcingRequest>(
            "SELECT * FROM sourcing_requests WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn list_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<SourcingRequest>, AppError> {
        let requests = sqlx::query_as::<_, SourcingRequest>(
            "SELECT * FROM sourcing_requests WHERE buyer_id = $1 ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Atualiza o status só se ele ainda for o `expected` (evita sobrescrever uma
    /// decisão concorrente).
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected: SourcingStatus,
        next: SourcingStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<SourcingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SourcingRequest>(
            r#"
            UPDATE sourcing_requests
            SET status = $1, rejection_reason = COALESCE($2, rejection_reason), updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(rejection_reason)
        .bind(id)
        .bind(expected)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    // =========================================================================
    //  COTAÇÕES
    // =========================================================================

    pub async fn create_quote<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        seller_id: Uuid,
        tenant_id: Uuid,
        price_amount: Decimal,
        price_currency: &str,
        quantity: i32,
        message: Option<&str>,
    ) -> Result<SourcingQuote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, SourcingQuote>(
            r#"
            INSERT INTO sourcing_quotes (
                request_id, seller_id, tenant_id, price_amount, price_currency, quantity, message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(seller_id)
        .bind(tenant_id)
        .bind(price_amount)
        .bind(price_currency)
        .bind(quantity)
        .bind(message)
        .fetch_one(executor)
        .await?;

        Ok(quote)
    }

    pub async fn list_quotes(&self, request_id: Uuid) -> Result<Vec<SourcingQuote>, AppError> {
        let quotes = sqlx::query_as::<_, SourcingQuote>(
            "SELECT * FROM sourcing_quotes WHERE request_id = $1 ORDER BY created_at ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }
}
