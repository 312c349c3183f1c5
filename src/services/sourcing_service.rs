// src/services/sourcing_service.rs

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SourcingRepository,
    models::{
        auth::User,
        money::Price,
        sourcing::{
            QuoteView, SourcingQuote, SourcingRequest, SourcingStatus, DEFAULT_EXPIRY_DAYS,
            MAX_EXPIRY_DAYS,
        },
    },
    services::fx_service::{display_price, FxService},
};

pub struct NewSourcingRequest<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub quantity: i32,
    pub unit: &'a str,
    pub target_price: Option<Price>,
    pub expires_in_days: Option<i64>,
}

pub struct NewQuote<'a> {
    pub price: Price,
    pub quantity: i32,
    pub message: Option<&'a str>,
}

#[derive(Clone)]
pub struct SourcingService {
    repo: SourcingRepository,
    fx_service: FxService,
    pool: PgPool,
}

/// Validade pedida, em dias, dentro de 1..=180.
pub fn resolve_expiry_days(requested: Option<i64>) -> Result<i64, AppError> {
    let days = requested.unwrap_or(DEFAULT_EXPIRY_DAYS);
    if !(1..=MAX_EXPIRY_DAYS).contains(&days) {
        return Err(AppError::field("expiresInDays", "validation.expiry_range"));
    }
    Ok(days)
}

impl SourcingService {
    pub fn new(repo: SourcingRepository, fx_service: FxService, pool: PgPool) -> Self {
        Self { repo, fx_service, pool }
    }

    pub async fn create_request(
        &self,
        buyer_id: Uuid,
        new: NewSourcingRequest<'_>,
    ) -> Result<SourcingRequest, AppError> {
        let days = resolve_expiry_days(new.expires_in_days)?;
        let expires_at = Utc::now() + Duration::days(days);

        let request = self
            .repo
            .create_request(
                &self.pool,
                buyer_id,
                new.title.trim(),
                new.description,
                new.category.trim(),
                new.quantity,
                new.unit.trim(),
                new.target_price.as_ref().map(|p| p.base_amount),
                new.target_price.as_ref().map(|p| p.base_currency.as_str()),
                expires_at,
            )
            .await?;

        tracing::info!("📣 Pedido de cotação {} criado por {} (expira {})", request.id, buyer_id, expires_at);
        Ok(request)
    }

    async fn expire_overdue(&self) -> Result<(), AppError> {
        let expired = self.repo.expire_overdue(&self.pool, Utc::now()).await?;
        if expired > 0 {
            tracing::info!("⌛ {} pedidos de cotação expirados", expired);
        }
        Ok(())
    }

    /// Pedidos abertos a cotações.
    pub async fn list_active(&self) -> Result<Vec<SourcingRequest>, AppError> {
        self.expire_overdue().await?;
        self.repo.list_by_status(SourcingStatus::Active).await
    }

    pub async fn list_pending(&self) -> Result<Vec<SourcingRequest>, AppError> {
        self.expire_overdue().await?;
        self.repo.list_by_status(SourcingStatus::Pending).await
    }

    pub async fn list_mine(&self, buyer_id: Uuid) -> Result<Vec<SourcingRequest>, AppError> {
        self.expire_overdue().await?;
        self.repo.list_by_buyer(buyer_id).await
    }

    /// Visível ao comprador, a admins e, se ativo, a todos.
    pub async fn get_request(&self, viewer: &User, request_id: Uuid) -> Result<SourcingRequest, AppError> {
        let now = Utc::now();
        let mut request = self
            .repo
            .find_request(&self.pool, request_id)
            .await?
            .filter(|r| {
                r.buyer_id == viewer.id || viewer.is_admin || r.effective_status(now) == SourcingStatus::Active
            })
            .ok_or(AppError::NotFound("sourcing_request"))?;

        request.status = request.effective_status(now);
        Ok(request)
    }

    async fn transition(
        &self,
        request: &SourcingRequest,
        next: SourcingStatus,
        reason: Option<&str>,
    ) -> Result<SourcingRequest, AppError> {
        request.check_transition(next, Utc::now())?;

        let updated = self
            .repo
            .update_status(&self.pool, request.id, request.status, next, reason)
            .await?
            .ok_or_else(|| AppError::InvalidStateTransition {
                from: request.status.as_str().to_string(),
                to: next.as_str().to_string(),
            })?;

        tracing::info!(
            "📣 Pedido {}: {} -> {}",
            updated.id,
            request.status.as_str(),
            updated.status.as_str()
        );
        Ok(updated)
    }

    async fn load(&self, request_id: Uuid) -> Result<SourcingRequest, AppError> {
        self.repo
            .find_request(&self.pool, request_id)
            .await?
            .ok_or(AppError::NotFound("sourcing_request"))
    }

    pub async fn approve(&self, request_id: Uuid) -> Result<SourcingRequest, AppError> {
        let request = self.load(request_id).await?;
        self.transition(&request, SourcingStatus::Active, None).await
    }

    pub async fn reject(&self, request_id: Uuid, reason: &str) -> Result<SourcingRequest, AppError> {
        let request = self.load(request_id).await?;

        // Rejeição é só para pedidos em revisão; ativos são fechados pelo comprador.
        let current = request.effective_status(Utc::now());
        if current != SourcingStatus::Pending {
            return Err(AppError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: SourcingStatus::Closed.as_str().to_string(),
            });
        }
        self.transition(&request, SourcingStatus::Closed, Some(reason)).await
    }

    pub async fn close(&self, buyer_id: Uuid, request_id: Uuid) -> Result<SourcingRequest, AppError> {
        let request = self.load(request_id).await?;
        if request.buyer_id != buyer_id {
            return Err(AppError::NotFound("sourcing_request"));
        }
        self.transition(&request, SourcingStatus::Closed, None).await
    }

    // =========================================================================
    //  COTAÇÕES
    // =========================================================================

    pub async fn submit_quote(
        &self,
        seller_id: Uuid,
        tenant_id: Uuid,
        request_id: Uuid,
        new: NewQuote<'_>,
    ) -> Result<SourcingQuote, AppError> {
        let request = self.load(request_id).await?;

        if request.buyer_id == seller_id {
            return Err(AppError::field("requestId", "validation.self_dealing"));
        }

        let now = Utc::now();
        if !request.accepts_quotes(now) {
            return Err(AppError::Conflict(format!(
                "o pedido está '{}' e não aceita cotações",
                request.effective_status(now).as_str()
            )));
        }

        let quote = self
            .repo
            .create_quote(
                &self.pool,
                request.id,
                seller_id,
                tenant_id,
                new.price.base_amount,
                &new.price.base_currency,
                new.quantity,
                new.message,
            )
            .await?;

        tracing::info!("💬 Cotação {} enviada para o pedido {}", quote.id, request.id);
        Ok(quote)
    }

    /// Cotações de um pedido, para o comprador dono (ou admin).
    pub async fn list_quotes(
        &self,
        viewer: &User,
        request_id: Uuid,
        currency: Option<&str>,
    ) -> Result<Vec<QuoteView>, AppError> {
        let request = self.load(request_id).await?;
        if request.buyer_id != viewer.id && !viewer.is_admin {
            return Err(AppError::NotFound("sourcing_request"));
        }

        let quotes = self.repo.list_quotes(request.id).await?;

        let rates = match currency {
            Some(_) => Some(self.fx_service.rate_table().await?),
            None => None,
        };

        Ok(quotes
            .into_iter()
            .map(|quote| {
                let shown = currency
                    .zip(rates.as_ref())
                    .map(|(target, rates)| display_price(&quote.price(), target, rates));
                QuoteView { quote, display_price: shown }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_defaults_to_thirty_days() {
        assert_eq!(resolve_expiry_days(None).unwrap(), 30);
    }

    #[test]
    fn expiry_outside_the_window_is_a_validation_error() {
        assert!(matches!(resolve_expiry_days(Some(0)), Err(AppError::ValidationError(_))));
        assert!(matches!(resolve_expiry_days(Some(181)), Err(AppError::ValidationError(_))));
        assert_eq!(resolve_expiry_days(Some(180)).unwrap(), 180);
    }
}
