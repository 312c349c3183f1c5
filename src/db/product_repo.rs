// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{Product, ProductStatus},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        seller_id: Uuid,
        name: &str,
        description: Option<&str>,
        category: &str,
        base_amount: Decimal,
        base_currency: &str,
        min_order_quantity: i32,
        unit: &str,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Todo anúncio nasce em 'pending_review' (valor padrão da coluna)
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                tenant_id, seller_id, name, description, category,
                base_amount, base_currency, min_order_quantity, unit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(seller_id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(base_amount)
        .bind(base_currency)
        .bind(min_order_quantity)
        .bind(unit)
        .fetch_one(executor)
        .await?;

        Ok(product)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    /// Vitrine pública: somente anúncios ativos.
    pub async fn list_active(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE status = 'active'
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR description ILIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            LIMIT 200
            "#,
        )
        .bind(category)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn list_by_tenant<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(products)
    }

    pub async fn list_by_status<'e, E>(&self, executor: E, status: ProductStatus) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE status = $1 ORDER BY created_at ASC",
        )
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(products)
    }

    /// Anúncios que contam para o limite do plano (ativos ou em revisão).
    pub async fn count_open_listings<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE tenant_id = $1 AND status IN ('active', 'pending_review')
            "#,
        )
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ProductStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET status = $1, rejection_reason = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(rejection_reason)
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(product)
    }
}
