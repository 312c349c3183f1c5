// tests/service_flows.rs
//
// Fluxos de serviço contra um Postgres real. Cada teste recebe um banco
// novo com as migrações aplicadas (`DATABASE_URL` aponta para o servidor).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

mod common;

use common::test_config;
use marketplace::common::error::AppError;
use marketplace::config::AppState;
use marketplace::db::{BillingRepository, TenantRepository, UserRepository};
use marketplace::models::billing::PaymentProvider;
use marketplace::models::money::Price;
use marketplace::models::offer::{OfferDecision, OfferStatus};
use marketplace::services::billing_service::{BillingService, WebhookSecrets};
use marketplace::services::offer_service::NewOffer;
use marketplace::services::payment_gateway::{PaymentGateway, ProviderPayment};
use marketplace::services::product_service::NewProduct;

fn state(pool: PgPool) -> AppState {
    AppState::from_pool(pool, test_config()).expect("estado da aplicação")
}

async fn seed_user(state: &AppState, email: &str) -> Uuid {
    state
        .user_repo
        .create_user(&state.db_pool, email, "hash-de-teste", email)
        .await
        .expect("usuário")
        .id
}

async fn seed_company(state: &AppState, owner_id: Uuid) -> Uuid {
    state
        .tenant_service
        .create_tenant_with_owner("Têxtil Aurora", None, Some("BR"), owner_id)
        .await
        .expect("empresa")
        .id
}

async fn seed_listing(pool: &PgPool, tenant_id: Uuid, seller_id: Uuid, status: &str) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO products (tenant_id, seller_id, name, category, base_amount, base_currency, unit, status)
        VALUES ($1, $2, 'Tecido de algodão', 'textiles', 12.50, 'BRL', 'metro', $3::product_status)
        RETURNING id
        "#,
    )
    .bind(tenant_id)
    .bind(seller_id)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("anúncio")
}

async fn seed_plan(pool: &PgPool, max_listings: i32) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO subscription_plans (name, price_amount, price_currency, duration_days, max_listings)
        VALUES ($1, 49.90, 'USD', 30, $2)
        RETURNING id
        "#,
    )
    .bind(format!("Plano {}", max_listings))
    .bind(max_listings)
    .fetch_one(pool)
    .await
    .expect("plano")
}

async fn subscription_expiry(pool: &PgPool, user_id: Uuid) -> Option<DateTime<Utc>> {
    sqlx::query_scalar("SELECT subscription_expires_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("validade da assinatura")
}

fn new_listing() -> NewProduct<'static> {
    NewProduct {
        name: "Fio de poliéster",
        description: Some("Bobinas de 5 kg"),
        category: "textiles",
        price: Price::new(Decimal::new(890, 2), "BRL"),
        min_order_quantity: 10,
        unit: "kg",
    }
}

/// Vendedor com um anúncio ativo e um comprador com uma oferta pendente.
async fn pending_offer(state: &AppState) -> (Uuid, Uuid, Uuid) {
    let seller = seed_user(state, "vendedor@aurora.com.br").await;
    let buyer = seed_user(state, "compras@atacado.in").await;
    let tenant = seed_company(state, seller).await;
    let product = seed_listing(&state.db_pool, tenant, seller, "active").await;

    let offer = state
        .offer_service
        .create_offer(
            seller,
            tenant,
            NewOffer {
                product_id: product,
                buyer_id: buyer,
                conversation_id: None,
                quantity: 500,
                price: Price::new(Decimal::new(1150, 2), "BRL"),
                notes: Some("Frete por conta do comprador"),
            },
        )
        .await
        .expect("oferta");

    (seller, buyer, offer.id)
}

#[sqlx::test(migrations = "./migrations")]
async fn only_the_buyer_may_answer_an_offer(pool: PgPool) {
    let state = state(pool);
    let (seller, _buyer, offer_id) = pending_offer(&state).await;

    let err = state
        .offer_service
        .respond_to_offer(seller, offer_id, OfferDecision::Accept)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden("offers:respond")));

    let offer = state.offer_service.get_offer(seller, offer_id).await.unwrap();
    assert_eq!(offer.status, OfferStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
async fn an_answered_offer_cannot_be_answered_again(pool: PgPool) {
    let state = state(pool);
    let (_seller, buyer, offer_id) = pending_offer(&state).await;

    let accepted = state
        .offer_service
        .respond_to_offer(buyer, offer_id, OfferDecision::Accept)
        .await
        .unwrap();
    assert_eq!(accepted.status, OfferStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    let err = state
        .offer_service
        .respond_to_offer(buyer, offer_id, OfferDecision::Decline)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    let offer = state.offer_service.get_offer(buyer, offer_id).await.unwrap();
    assert_eq!(offer.status, OfferStatus::Accepted);
}

#[sqlx::test(migrations = "./migrations")]
async fn a_repeated_payment_webhook_changes_nothing(pool: PgPool) {
    let state = state(pool.clone());
    let user = seed_user(&state, "assinante@aurora.com.br").await;
    let plan = seed_plan(&pool, 10).await;

    sqlx::query(
        r#"
        INSERT INTO payments (user_id, plan_id, provider, provider_reference, amount, currency)
        VALUES ($1, $2, 'stripe', 'pi_3Qx7Aurora', 49.90, 'USD')
        "#,
    )
    .bind(user)
    .bind(plan)
    .execute(&pool)
    .await
    .unwrap();

    let invoice = state
        .billing_service
        .settle_success(PaymentProvider::Stripe, "pi_3Qx7Aurora")
        .await
        .unwrap()
        .expect("a primeira liquidação emite fatura");
    assert_eq!(invoice.user_id, user);
    assert_eq!(invoice.plan_id, plan);
    assert!(invoice.number.starts_with("INV-"));

    let first_expiry = subscription_expiry(&pool, user).await;
    assert_eq!(first_expiry, Some(invoice.period_end));

    let repeated = state
        .billing_service
        .settle_success(PaymentProvider::Stripe, "pi_3Qx7Aurora")
        .await
        .unwrap();
    assert!(repeated.is_none());

    assert_eq!(subscription_expiry(&pool, user).await, first_expiry);

    let invoices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(invoices, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn free_tier_rejects_the_fourth_open_listing(pool: PgPool) {
    let state = state(pool.clone());
    let seller = seed_user(&state, "vendedor@aurora.com.br").await;
    let tenant = seed_company(&state, seller).await;
    seed_listing(&pool, tenant, seller, "active").await;
    seed_listing(&pool, tenant, seller, "active").await;
    seed_listing(&pool, tenant, seller, "pending_review").await;
    // Arquivado não conta.
    seed_listing(&pool, tenant, seller, "archived").await;

    let mut tx = pool.begin().await.unwrap();
    let err = state
        .product_service
        .create_product(&mut *tx, tenant, seller, new_listing())
        .await
        .unwrap_err();
    tx.rollback().await.unwrap();

    assert!(matches!(err, AppError::SubscriptionRequired));

    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE tenant_id = $1 AND status IN ('active', 'pending_review')",
    )
    .bind(tenant)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(open, 3);
}

/// Com uma única conexão no pool, qualquer consulta fora da transação
/// ficaria esperando a conexão que a própria transação segura.
#[sqlx::test(migrations = "./migrations")]
async fn listing_creation_runs_on_the_callers_connection(
    pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let pool = pool_options
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .connect_with(connect_options)
        .await
        .unwrap();
    let state = state(pool.clone());

    let seller = seed_user(&state, "vendedor@aurora.com.br").await;
    let tenant = seed_company(&state, seller).await;
    let plan = seed_plan(&pool, 5).await;
    sqlx::query(
        "UPDATE users SET subscription_plan_id = $1, subscription_expires_at = NOW() + INTERVAL '30 days' WHERE id = $2",
    )
    .bind(plan)
    .bind(seller)
    .execute(&pool)
    .await
    .unwrap();
    for _ in 0..3 {
        seed_listing(&pool, tenant, seller, "active").await;
    }

    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant.to_string())
        .execute(&mut *tx)
        .await
        .unwrap();

    let product = state
        .product_service
        .create_product(&mut *tx, tenant, seller, new_listing())
        .await
        .expect("o plano libera o quarto anúncio sem abrir outra conexão");
    tx.commit().await.unwrap();

    assert_eq!(product.tenant_id, tenant);
    assert_eq!(product.base_currency, "BRL");
}

/// Provedor falso que guarda o preço recebido.
#[derive(Default)]
struct RecordingGateway {
    charged: Mutex<Vec<Price>>,
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment(
        &self,
        price: &Price,
        payment_id: Uuid,
        _user_id: Uuid,
    ) -> Result<ProviderPayment, AppError> {
        self.charged.lock().unwrap().push(price.clone());
        Ok(ProviderPayment {
            reference: format!("pi_{}", payment_id.simple()),
            client_token: "pi_secret".into(),
        })
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn checkout_charges_the_plan_price_in_its_currency(pool: PgPool) {
    let gateway = Arc::new(RecordingGateway::default());
    let stripe: Arc<dyn PaymentGateway> = gateway.clone();
    let billing = BillingService::new(
        BillingRepository::new(pool.clone()),
        UserRepository::new(pool.clone()),
        TenantRepository::new(pool.clone()),
        pool.clone(),
        Some(stripe),
        None,
        WebhookSecrets::default(),
    );

    let user = UserRepository::new(pool.clone())
        .create_user(&pool, "compras@tokyo-trade.jp", "hash-de-teste", "Tokyo Trade")
        .await
        .unwrap();
    let plan: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO subscription_plans (name, price_amount, price_currency, duration_days, max_listings)
        VALUES ('Pro Japão', 4900, 'jpy', 30, 50)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let checkout = billing.checkout(&user, plan, PaymentProvider::Stripe).await.unwrap();

    let charged = gateway.charged.lock().unwrap().clone();
    assert_eq!(charged, vec![Price::new(Decimal::new(4900, 0), "JPY")]);
    assert_eq!(checkout.currency, "JPY");
    assert!(checkout.provider_reference.starts_with("pi_"));

    let err = billing.checkout(&user, plan, PaymentProvider::Razorpay).await.unwrap_err();
    assert!(matches!(err, AppError::ProviderNotConfigured("razorpay")));
}
