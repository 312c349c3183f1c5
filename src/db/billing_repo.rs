// src/db/billing_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{Invoice, Payment, PaymentProvider, PaymentStatus, SubscriptionPlan},
};

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PLANOS
    // =========================================================================

    pub async fn list_active_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let plans = sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE is_active ORDER BY price_amount ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    pub async fn find_plan<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(plan)
    }

    pub async fn create_plan<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        price_amount: Decimal,
        price_currency: &str,
        duration_days: i32,
        max_listings: i32,
    ) -> Result<SubscriptionPlan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            INSERT INTO subscription_plans (
                name, description, price_amount, price_currency, duration_days, max_listings
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price_amount)
        .bind(price_currency)
        .bind(duration_days)
        .bind(max_listings)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("já existe um plano com esse nome".into());
                }
            }
            e.into()
        })
    }

    pub async fn set_plan_active<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(
            "UPDATE subscription_plans SET is_active = $1 WHERE id = $2 RETURNING *",
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(plan)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        user_id: Uuid,
        plan_id: Uuid,
        provider: PaymentProvider,
        provider_reference: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, user_id, plan_id, provider, provider_reference, amount, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(plan_id)
        .bind(provider)
        .bind(provider_reference)
        .bind(amount)
        .bind(currency)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    /// Trava a linha do pagamento: dois webhooks iguais não liquidam duas vezes.
    pub async fn find_payment_for_update<'e, E>(
        &self,
        executor: E,
        provider: PaymentProvider,
        provider_reference: &str,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE provider = $1 AND provider_reference = $2
            FOR UPDATE
            "#,
        )
        .bind(provider)
        .bind(provider_reference)
        .fetch_optional(executor)
        .await?;

        Ok(payment)
    }

    pub async fn set_payment_status<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(payment_id)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    pub async fn next_invoice_sequence<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('invoice_number_seq')")
            .fetch_one(executor)
            .await?;

        Ok(seq)
    }

    pub async fn create_invoice<'e, E>(
        &self,
        executor: E,
        number: &str,
        payment: &Payment,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                number, user_id, payment_id, plan_id, amount, currency, period_start, period_end
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(number)
        .bind(payment.user_id)
        .bind(payment.id)
        .bind(payment.plan_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn list_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE user_id = $1 ORDER BY issued_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn find_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }
}
