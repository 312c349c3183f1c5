// src/db/offer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::offer::{Offer, OfferStatus},
};

#[derive(Clone)]
pub struct OfferRepository {
    pool: PgPool,
}

impl OfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_offer<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        conversation_id: Option<Uuid>,
        buyer_id: Uuid,
        seller_id: Uuid,
        tenant_id: Uuid,
        quantity: i32,
        price_amount: Decimal,
        price_currency: &str,
        notes: Option<&str>,
    ) -> Result<Offer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(
            r#"
            INSERT INTO offers (
                product_id, conversation_id, buyer_id, seller_id, tenant_id,
                quantity, price_amount, price_currency, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(conversation_id)
        .bind(buyer_id)
        .bind(seller_id)
        .bind(tenant_id)
        .bind(quantity)
        .bind(price_amount)
        .bind(price_currency)
        .bind(notes)
        .fetch_one(executor)
        .await?;

        Ok(offer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>, AppError> {
        let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(offer)
    }

    pub async fn list_for_user(&self, user_id: Uuid, status: Option<OfferStatus>) -> Result<Vec<Offer>, AppError> {
        let offers = sqlx::query_as::<_, Offer>(
            r#"
            SELECT * FROM offers
            WHERE (buyer_id = $1 OR seller_id = $1)
              AND ($2::offer_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(offers)
    }

    /// Resposta do comprador. O `WHERE status = 'pending'` garante que só a primeira
    /// resposta vale: se outra já gravou, nenhuma linha volta.
    pub async fn respond<'e, E>(
        &self,
        executor: E,
        offer_id: Uuid,
        buyer_id: Uuid,
        status: OfferStatus,
    ) -> Result<Option<Offer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(
            r#"
            UPDATE offers
            SET status = $1, responded_at = NOW()
            WHERE id = $2 AND buyer_id = $3 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(offer_id)
        .bind(buyer_id)
        .fetch_optional(executor)
        .await?;

        Ok(offer)
    }
}
