// src/services/offer_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OfferRepository, UserRepository},
    models::{
        money::Price,
        offer::{Offer, OfferDecision, OfferStatus},
    },
    services::{messaging_service::MessagingService, product_service::ProductService},
};

pub struct NewOffer<'a> {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub quantity: i32,
    pub price: Price,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct OfferService {
    repo: OfferRepository,
    user_repo: UserRepository,
    product_service: ProductService,
    messaging_service: MessagingService,
    pool: PgPool,
}

impl OfferService {
    pub fn new(
        repo: OfferRepository,
        user_repo: UserRepository,
        product_service: ProductService,
        messaging_service: MessagingService,
        pool: PgPool,
    ) -> Self {
        Self { repo, user_repo, product_service, messaging_service, pool }
    }

    /// O vendedor propõe preço e quantidade para um anúncio ativo da sua empresa.
    pub async fn create_offer(
        &self,
        seller_id: Uuid,
        tenant_id: Uuid,
        new: NewOffer<'_>,
    ) -> Result<Offer, AppError> {
        let product = self.product_service.find_active(new.product_id).await?;
        if product.tenant_id != tenant_id {
            return Err(AppError::NotFound("product"));
        }

        if new.buyer_id == seller_id {
            return Err(AppError::field("buyerId", "validation.self_dealing"));
        }

        self.user_repo
            .find_by_id(new.buyer_id)
            .await?
            .filter(|u| !u.is_suspended)
            .ok_or(AppError::UserNotFound)?;

        let mut tx = self.pool.begin().await?;

        // A conversa precisa ser deste anúncio com este comprador.
        if let Some(conversation_id) = new.conversation_id {
            self.messaging_service
                .find_conversation(&mut *tx, conversation_id)
                .await?
                .filter(|c| c.product_id == Some(product.id) && c.buyer_id == new.buyer_id)
                .ok_or(AppError::NotFound("conversation"))?;
        }

        let offer = self
            .repo
            .create_offer(
                &mut *tx,
                product.id,
                new.conversation_id,
                new.buyer_id,
                seller_id,
                tenant_id,
                new.quantity,
                new.price.base_amount,
                &new.price.base_currency,
                new.notes,
            )
            .await?;

        if let Some(conversation_id) = offer.conversation_id {
            let body = format!(
                "Oferta enviada: {} {} por {} {} cada (total {} {}).",
                offer.quantity,
                product.unit,
                offer.price_amount,
                offer.price_currency,
                offer.total(),
                offer.price_currency
            );
            self.messaging_service
                .post_system_message(&mut *tx, conversation_id, seller_id, &body)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("🤝 Oferta {} criada: vendedor {} -> comprador {}", offer.id, seller_id, offer.buyer_id);
        Ok(offer)
    }

    /// Só o comprador responde, e só uma vez.
    pub async fn respond_to_offer(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        decision: OfferDecision,
    ) -> Result<Offer, AppError> {
        let offer = self.get_offer(user_id, offer_id).await?;

        if offer.buyer_id != user_id {
            return Err(AppError::Forbidden("offers:respond"));
        }

        let next = offer.status.transition(decision)?;

        let mut tx = self.pool.begin().await?;

        let Some(updated) = self.repo.respond(&mut *tx, offer.id, user_id, next).await? else {
            // Outra resposta gravou primeiro.
            let current = self
                .repo
                .find_by_id(offer.id)
                .await?
                .ok_or(AppError::NotFound("offer"))?
                .status;
            return Err(AppError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        };

        if let Some(conversation_id) = updated.conversation_id {
            let body = match decision {
                OfferDecision::Accept => "Oferta aceita.",
                OfferDecision::Decline => "Oferta recusada.",
            };
            self.messaging_service
                .post_system_message(&mut *tx, conversation_id, user_id, body)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("📝 Oferta {}: pending -> {}", updated.id, updated.status.as_str());
        Ok(updated)
    }

    pub async fn list_offers(&self, user_id: Uuid, status: Option<OfferStatus>) -> Result<Vec<Offer>, AppError> {
        self.repo.list_for_user(user_id, status).await
    }

    pub async fn get_offer(&self, user_id: Uuid, offer_id: Uuid) -> Result<Offer, AppError> {
        self.repo
            .find_by_id(offer_id)
            .await?
            .filter(|o| o.is_participant(user_id))
            .ok_or(AppError::NotFound("offer"))
    }
}
