// src/services/billing_service.rs

use std::sync::Arc;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, TenantRepository, UserRepository},
    models::{
        auth::User,
        billing::{
            format_invoice_number, next_subscription_period, CheckoutResponse, Invoice,
            PaymentProvider, PaymentStatus, SubscriptionPlan, SubscriptionStatus,
            FREE_TIER_MAX_LISTINGS,
        },
    },
    services::{
        payment_gateway::PaymentGateway,
        webhook::{
            parse_razorpay_event, parse_stripe_event, verify_razorpay_signature,
            verify_stripe_signature, PaymentEvent,
        },
    },
};

#[derive(Clone, Default)]
pub struct WebhookSecrets {
    pub stripe: Option<String>,
    pub razorpay: Option<String>,
}

#[derive(Clone)]
pub struct BillingService {
    billing_repo: BillingRepository,
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
    stripe: Option<Arc<dyn PaymentGateway>>,
    razorpay: Option<Arc<dyn PaymentGateway>>,
    webhook_secrets: WebhookSecrets,
}

impl BillingService {
    pub fn new(
        billing_repo: BillingRepository,
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        pool: PgPool,
        stripe: Option<Arc<dyn PaymentGateway>>,
        razorpay: Option<Arc<dyn PaymentGateway>>,
        webhook_secrets: WebhookSecrets,
    ) -> Self {
        Self { billing_repo, user_repo, tenant_repo, pool, stripe, razorpay, webhook_secrets }
    }

    fn gateway(&self, provider: PaymentProvider) -> Result<&Arc<dyn PaymentGateway>, AppError> {
        let gateway = match provider {
            PaymentProvider::Stripe => self.stripe.as_ref(),
            PaymentProvider::Razorpay => self.razorpay.as_ref(),
        };
        gateway.ok_or(AppError::ProviderNotConfigured(provider.as_str()))
    }

    // =========================================================================
    //  PLANOS
    // =========================================================================

    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.billing_repo.list_active_plans().await
    }

    pub async fn create_plan(
        &self,
        name: &str,
        description: Option<&str>,
        price: &crate::models::money::Price,
        duration_days: i32,
        max_listings: i32,
    ) -> Result<SubscriptionPlan, AppError> {
        let plan = self
            .billing_repo
            .create_plan(
                &self.pool,
                name,
                description,
                price.base_amount,
                &price.base_currency,
                duration_days,
                max_listings,
            )
            .await?;

        tracing::info!("📦 Plano criado: {} ({})", plan.name, plan.id);
        Ok(plan)
    }

    pub async fn set_plan_active(&self, plan_id: Uuid, is_active: bool) -> Result<SubscriptionPlan, AppError> {
        self.billing_repo
            .set_plan_active(&self.pool, plan_id, is_active)
            .await?
            .ok_or(AppError::NotFound("plan"))
    }

    // =========================================================================
    //  CHECKOUT
    // =========================================================================

    /// Cria o pagamento no provedor e registra localmente em `created`.
    /// A assinatura só muda quando o webhook confirmar.
    pub async fn checkout(
        &self,
        user: &User,
        plan_id: Uuid,
        provider: PaymentProvider,
    ) -> Result<CheckoutResponse, AppError> {
        let plan = self
            .billing_repo
            .find_plan(&self.pool, plan_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(AppError::NotFound("plan"))?;

        let gateway = self.gateway(provider)?;
        let payment_id = Uuid::new_v4();
        let price = plan.price();

        let created = gateway.create_payment(&price, payment_id, user.id).await?;

        let payment = self
            .billing_repo
            .create_payment(
                &self.pool,
                payment_id,
                user.id,
                plan.id,
                provider,
                &created.reference,
                price.base_amount,
                &price.base_currency,
            )
            .await?;

        tracing::info!(
            "💳 Checkout {} iniciado: usuário {}, plano {}, {}",
            payment.id,
            user.id,
            plan.id,
            provider.as_str()
        );

        Ok(CheckoutResponse {
            payment_id: payment.id,
            provider,
            provider_reference: payment.provider_reference,
            client_token: created.client_token,
            amount: payment.amount,
            currency: payment.currency,
        })
    }

    // =========================================================================
    //  WEBHOOKS
    // =========================================================================

    pub async fn handle_stripe_webhook(&self, payload: &[u8], signature: &str) -> Result<(), AppError> {
        let secret = self
            .webhook_secrets
            .stripe
            .as_deref()
            .ok_or(AppError::ProviderNotConfigured("stripe"))?;

        verify_stripe_signature(payload, signature, secret, Utc::now().timestamp())?;
        let event = parse_stripe_event(payload)?;
        self.apply_event(PaymentProvider::Stripe, event).await
    }

    pub async fn handle_razorpay_webhook(&self, payload: &[u8], signature: &str) -> Result<(), AppError> {
        let secret = self
            .webhook_secrets
            .razorpay
            .as_deref()
            .ok_or(AppError::ProviderNotConfigured("razorpay"))?;

        verify_razorpay_signature(payload, signature, secret)?;
        let event = parse_razorpay_event(payload)?;
        self.apply_event(PaymentProvider::Razorpay, event).await
    }

    async fn apply_event(&self, provider: PaymentProvider, event: PaymentEvent) -> Result<(), AppError> {
        match event {
            PaymentEvent::Succeeded { reference } => {
                self.settle_success(provider, &reference).await.map(|_| ())
            }
            PaymentEvent::Failed { reference } => self.settle_failure(provider, &reference).await,
            PaymentEvent::Ignored { event_type } => {
                tracing::debug!("Evento {} ignorado: {}", provider.as_str(), event_type);
                Ok(())
            }
        }
    }

    /// Confirma o pagamento, estende a assinatura e emite a fatura, tudo numa
    /// transação. Repetir o mesmo webhook não faz nada.
    pub async fn settle_success(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(payment) = self
            .billing_repo
            .find_payment_for_update(&mut *tx, provider, reference)
            .await?
        else {
            tracing::warn!("Webhook {} para pagamento desconhecido: {}", provider.as_str(), reference);
            return Ok(None);
        };

        if payment.status == PaymentStatus::Succeeded {
            tracing::info!("Pagamento {} já liquidado; webhook repetido", payment.id);
            return Ok(None);
        }

        let user = self
            .user_repo
            .find_by_id_with(&mut *tx, payment.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let plan = self
            .billing_repo
            .find_plan(&mut *tx, payment.plan_id)
            .await?
            .ok_or(AppError::NotFound("plan"))?;

        let now = Utc::now();
        let (period_start, period_end) = next_subscription_period(
            now,
            user.subscription_plan_id,
            user.subscription_expires_at,
            plan.id,
            plan.duration_days,
        );

        self.user_repo
            .update_subscription(&mut *tx, user.id, plan.id, period_end)
            .await?;

        let payment = self
            .billing_repo
            .set_payment_status(&mut *tx, payment.id, PaymentStatus::Succeeded)
            .await?;

        let invoice = self.issue_invoice(&mut *tx, &payment, period_start, period_end).await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Pagamento {} liquidado: usuário {} no plano {} até {}",
            payment.id,
            user.id,
            plan.id,
            period_end
        );

        Ok(Some(invoice))
    }

    async fn issue_invoice(
        &self,
        conn: &mut PgConnection,
        payment: &crate::models::billing::Payment,
        period_start: chrono::DateTime<Utc>,
        period_end: chrono::DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        let seq = self.billing_repo.next_invoice_sequence(&mut *conn).await?;
        let number = format_invoice_number(Utc::now(), seq);

        self.billing_repo
            .create_invoice(&mut *conn, &number, payment, period_start, period_end)
            .await
    }

    pub async fn settle_failure(&self, provider: PaymentProvider, reference: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        match self
            .billing_repo
            .find_payment_for_update(&mut *tx, provider, reference)
            .await?
        {
            Some(payment) if payment.status == PaymentStatus::Created => {
                self.billing_repo
                    .set_payment_status(&mut *tx, payment.id, PaymentStatus::Failed)
                    .await?;
                tracing::info!("❌ Pagamento {} falhou", payment.id);
            }
            Some(payment) => {
                tracing::warn!(
                    "Falha recebida para pagamento {} já em {:?}; ignorada",
                    payment.id,
                    payment.status
                );
            }
            None => {
                tracing::warn!("Falha {} para pagamento desconhecido: {}", provider.as_str(), reference);
            }
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  ASSINATURA E LIMITES
    // =========================================================================

    pub async fn subscription_status(&self, user: &User) -> Result<SubscriptionStatus, AppError> {
        let plan = match user.subscription_plan_id {
            Some(plan_id) => self.billing_repo.find_plan(&self.pool, plan_id).await?,
            None => None,
        };

        Ok(SubscriptionStatus {
            plan,
            expires_at: user.subscription_expires_at,
            is_active: user.has_active_subscription(Utc::now()),
        })
    }

    /// A assinatura que vale para a empresa é a do dono (primeiro membro).
    pub async fn tenant_subscription(&self, tenant_id: Uuid) -> Result<SubscriptionStatus, AppError> {
        let owner_id = self
            .tenant_repo
            .find_owner_id(&self.pool, tenant_id)
            .await?
            .ok_or(AppError::NotFound("tenant"))?;

        let owner = self.user_repo.find_by_id(owner_id).await?.ok_or(AppError::UserNotFound)?;
        self.subscription_status(&owner).await
    }

    /// Quantos anúncios abertos (ativos ou em revisão) a empresa pode ter.
    pub async fn listing_limit(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<i64, AppError> {
        let Some(owner_id) = self.tenant_repo.find_owner_id(&mut *conn, tenant_id).await? else {
            return Ok(FREE_TIER_MAX_LISTINGS);
        };

        let Some(owner) = self.user_repo.find_by_id_with(&mut *conn, owner_id).await? else {
            return Ok(FREE_TIER_MAX_LISTINGS);
        };

        let plan = match owner.subscription_plan_id {
            Some(plan_id) if owner.has_active_subscription(Utc::now()) => {
                self.billing_repo.find_plan(&mut *conn, plan_id).await?
            }
            _ => None,
        };

        Ok(plan.map_or(FREE_TIER_MAX_LISTINGS, |p| i64::from(p.max_listings).max(FREE_TIER_MAX_LISTINGS)))
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    pub async fn list_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        self.billing_repo.list_invoices(user_id).await
    }

    pub async fn find_invoice(&self, user: &User, invoice_id: Uuid) -> Result<Invoice, AppError> {
        self.billing_repo
            .find_invoice(invoice_id)
            .await?
            .filter(|inv| inv.user_id == user.id || user.is_admin)
            .ok_or(AppError::NotFound("invoice"))
    }

    pub async fn find_plan(&self, plan_id: Uuid) -> Result<SubscriptionPlan, AppError> {
        self.billing_repo
            .find_plan(&self.pool, plan_id)
            .await?
            .ok_or(AppError::NotFound("plan"))
    }
}
