// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        BillingRepository, FxRepository, MessagingRepository, OfferRepository, ProductRepository,
        RbacRepository, SourcingRepository, TenantRepository, UserRepository,
    },
    services::{
        ai_service::{AiService, DEFAULT_MODEL},
        auth::AuthService,
        billing_service::{BillingService, WebhookSecrets},
        fx_service::FxService,
        invoice_service::InvoiceService,
        messaging_service::MessagingService,
        offer_service::OfferService,
        payment_gateway::{PaymentGateway, RazorpayGateway, StripeGateway},
        product_service::ProductService,
        rbac_service::RbacService,
        sourcing_service::SourcingService,
        tenancy_service::TenantService,
    },
};

/// Variáveis de ambiente lidas na partida.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub razorpay_webhook_secret: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub invoice_font_dir: String,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            razorpay_key_id: optional("RAZORPAY_KEY_ID"),
            razorpay_key_secret: optional("RAZORPAY_KEY_SECRET"),
            razorpay_webhook_secret: optional("RAZORPAY_WEBHOOK_SECRET"),
            ai_api_key: optional("AI_API_KEY"),
            ai_model: optional("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            invoice_font_dir: optional("INVOICE_FONT_DIR").unwrap_or_else(|| "./fonts".to_string()),
        })
    }
}

// O estado compartilhado por toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub tenancy_repo: TenantRepository,
    pub rbac_repo: RbacRepository,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub fx_service: FxService,
    pub product_service: ProductService,
    pub offer_service: OfferService,
    pub sourcing_service: SourcingService,
    pub messaging_service: MessagingService,
    pub billing_service: BillingService,
    pub invoice_service: InvoiceService,
    pub user_repo: UserRepository,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    /// Monta o grafo de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenancy_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let offer_repo = OfferRepository::new(db_pool.clone());
        let sourcing_repo = SourcingRepository::new(db_pool.clone());
        let messaging_repo = MessagingRepository::new(db_pool.clone());
        let fx_repo = FxRepository::new(db_pool.clone());
        let billing_repo = BillingRepository::new(db_pool.clone());

        let stripe: Option<Arc<dyn PaymentGateway>> = match &config.stripe_secret_key {
            Some(key) => Some(Arc::new(StripeGateway::new(key.clone())?)),
            None => None,
        };
        let razorpay: Option<Arc<dyn PaymentGateway>> =
            match (&config.razorpay_key_id, &config.razorpay_key_secret) {
                (Some(id), Some(secret)) => Some(Arc::new(RazorpayGateway::new(id.clone(), secret.clone())?)),
                _ => None,
            };
        if stripe.is_none() && razorpay.is_none() {
            tracing::warn!("Nenhum provedor de pagamento configurado: checkout indisponível");
        }

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone(), db_pool.clone());
        let tenant_service = TenantService::new(tenancy_repo.clone(), rbac_repo.clone(), db_pool.clone());
        let rbac_service = RbacService::new(rbac_repo.clone(), db_pool.clone());
        let fx_service = FxService::new(fx_repo);
        let ai_service = AiService::new(config.ai_api_key.clone(), config.ai_model.clone())?;
        let billing_service = BillingService::new(
            billing_repo,
            user_repo.clone(),
            tenancy_repo.clone(),
            db_pool.clone(),
            stripe,
            razorpay,
            WebhookSecrets {
                stripe: config.stripe_webhook_secret.clone(),
                razorpay: config.razorpay_webhook_secret.clone(),
            },
        );
        let product_service = ProductService::new(
            product_repo,
            billing_service.clone(),
            ai_service,
            fx_service.clone(),
        );
        let messaging_service = MessagingService::new(messaging_repo, db_pool.clone());
        let offer_service = OfferService::new(
            offer_repo,
            user_repo.clone(),
            product_service.clone(),
            messaging_service.clone(),
            db_pool.clone(),
        );
        let sourcing_service = SourcingService::new(sourcing_repo, fx_service.clone(), db_pool.clone());
        let invoice_service = InvoiceService::new(config.invoice_font_dir.clone());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            tenancy_repo,
            rbac_repo,
            auth_service,
            tenant_service,
            rbac_service,
            fx_service,
            product_service,
            offer_service,
            sourcing_service,
            messaging_service,
            billing_service,
            invoice_service,
            user_repo,
        })
    }
}
