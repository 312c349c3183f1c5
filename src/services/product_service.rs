// src/services/product_service.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::{
        money::Price,
        product::{Product, ProductQuery, ProductStatus, ProductView},
    },
    services::{
        ai_service::AiService,
        billing_service::BillingService,
        fx_service::{display_price, FxService},
    },
};

/// Dados de um novo anúncio, já validados no handler.
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub price: Price,
    pub min_order_quantity: i32,
    pub unit: &'a str,
}

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    billing_service: BillingService,
    ai_service: AiService,
    fx_service: FxService,
}

fn check_transition(product: &Product, next: ProductStatus) -> Result<(), AppError> {
    if product.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidStateTransition {
            from: product.status.as_str().to_string(),
            to: next.as_str().to_string(),
        })
    }
}

impl ProductService {
    pub fn new(
        repo: ProductRepository,
        billing_service: BillingService,
        ai_service: AiService,
        fx_service: FxService,
    ) -> Self {
        Self { repo, billing_service, ai_service, fx_service }
    }

    /// Passa nome e descrição pela moderação. Chamar antes de abrir a transação:
    /// a chamada ao provedor não deve segurar conexão do pool.
    pub async fn moderate_listing(&self, tenant_id: Uuid, new: &NewProduct<'_>) -> Result<(), AppError> {
        let text = format!("{}\n{}", new.name, new.description.unwrap_or_default());
        let verdict = self.ai_service.moderate(&text).await;
        if verdict.flagged {
            let reason = verdict.reason.unwrap_or_else(|| "conteúdo impróprio".to_string());
            tracing::info!("🚫 Anúncio recusado pela moderação (empresa {}): {}", tenant_id, reason);
            return Err(AppError::ContentRejected(reason));
        }
        Ok(())
    }

    /// Cria o anúncio em `pending_review`. `conn` deve ser uma transação RLS da empresa
    /// e o conteúdo já deve ter passado por `moderate_listing`.
    pub async fn create_product(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        seller_id: Uuid,
        new: NewProduct<'_>,
    ) -> Result<Product, AppError> {
        let open = self.repo.count_open_listings(&mut *conn, tenant_id).await?;
        let limit = self.billing_service.listing_limit(&mut *conn, tenant_id).await?;
        if open >= limit {
            return Err(AppError::SubscriptionRequired);
        }

        let product = self
            .repo
            .create_product(
                &mut *conn,
                tenant_id,
                seller_id,
                new.name.trim(),
                new.description,
                new.category.trim(),
                new.price.base_amount,
                &new.price.base_currency,
                new.min_order_quantity,
                new.unit.trim(),
            )
            .await?;

        tracing::info!("🆕 Anúncio {} criado pela empresa {}", product.id, tenant_id);
        Ok(product)
    }

    /// Catálogo público: só anúncios ativos, com preço convertido se pedido.
    pub async fn list_catalogue(&self, query: &ProductQuery) -> Result<Vec<ProductView>, AppError> {
        let products = self
            .repo
            .list_active(query.category.as_deref(), query.q.as_deref())
            .await?;

        self.with_display_prices(products, query.currency.as_deref()).await
    }

    pub async fn get_public_product(&self, id: Uuid, currency: Option<&str>) -> Result<ProductView, AppError> {
        let product = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|p| p.status == ProductStatus::Active)
            .ok_or(AppError::NotFound("product"))?;

        let mut views = self.with_display_prices(vec![product], currency).await?;
        views.pop().ok_or(AppError::NotFound("product"))
    }

    /// Anúncio ativo para negociação (ofertas e conversas).
    pub async fn find_active(&self, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|p| p.status == ProductStatus::Active)
            .ok_or(AppError::NotFound("product"))
    }

    async fn with_display_prices(
        &self,
        products: Vec<Product>,
        currency: Option<&str>,
    ) -> Result<Vec<ProductView>, AppError> {
        let Some(currency) = currency else {
            return Ok(products
                .into_iter()
                .map(|product| ProductView { product, display_price: None })
                .collect());
        };

        let rates = self.fx_service.rate_table().await?;
        Ok(products
            .into_iter()
            .map(|product| {
                let shown = display_price(&product.price(), currency, &rates);
                ProductView { product, display_price: Some(shown) }
            })
            .collect())
    }

    pub async fn list_tenant_products(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<Vec<Product>, AppError> {
        self.repo.list_by_tenant(conn, tenant_id).await
    }

    pub async fn archive_product(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Product, AppError> {
        let product = self
            .repo
            .find_for_update(&mut *conn, product_id)
            .await?
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or(AppError::NotFound("product"))?;

        check_transition(&product, ProductStatus::Archived)?;
        self.repo.update_status(&mut *conn, product.id, ProductStatus::Archived, None).await
    }

    // =========================================================================
    //  MODERAÇÃO (admin)
    // =========================================================================

    pub async fn list_by_status(
        &self,
        conn: &mut PgConnection,
        status: ProductStatus,
    ) -> Result<Vec<Product>, AppError> {
        self.repo.list_by_status(conn, status).await
    }

    /// `conn` deve ser uma transação de admin.
    pub async fn review_product(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        next: ProductStatus,
        reason: Option<&str>,
    ) -> Result<Product, AppError> {
        let product = self
            .repo
            .find_for_update(&mut *conn, product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        check_transition(&product, next)?;

        let updated = self.repo.update_status(&mut *conn, product.id, next, reason).await?;
        tracing::info!(
            "🛡️ Anúncio {}: {} -> {}",
            updated.id,
            product.status.as_str(),
            updated.status.as_str()
        );
        Ok(updated)
    }

    pub async fn enhance_description(&self, name: &str, description: &str) -> Result<String, AppError> {
        self.ai_service.enhance_description(name, description).await
    }
}
