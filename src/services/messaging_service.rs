// src/services/messaging_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::MessagingRepository,
    models::{
        messaging::{Conversation, Message},
        product::Product,
    },
};

#[derive(Clone)]
pub struct MessagingService {
    repo: MessagingRepository,
    pool: PgPool,
}

impl MessagingService {
    pub fn new(repo: MessagingRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Abre (ou reaproveita) a conversa do comprador com o vendedor do anúncio.
    pub async fn open_conversation(&self, buyer_id: Uuid, product: &Product) -> Result<Conversation, AppError> {
        if product.seller_id == buyer_id {
            return Err(AppError::field("productId", "validation.self_dealing"));
        }

        self.repo
            .open_conversation(&self.pool, product.id, buyer_id, product.seller_id)
            .await
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        self.repo.list_for_user(user_id).await
    }

    /// A conversa, se `user_id` participa. Para os demais ela não existe.
    pub async fn conversation_for(&self, user_id: Uuid, conversation_id: Uuid) -> Result<Conversation, AppError> {
        self.repo
            .find_by_id(&self.pool, conversation_id)
            .await?
            .filter(|c| c.is_participant(user_id))
            .ok_or(AppError::NotFound("conversation"))
    }

    pub async fn post_message(
        &self,
        sender_id: Uuid,
        conversation_id: Uuid,
        body: &str,
    ) -> Result<Message, AppError> {
        let conversation = self.conversation_for(sender_id, conversation_id).await?;
        self.repo.add_message(&self.pool, conversation.id, sender_id, body.trim()).await
    }

    /// Mensagem gerada pelo sistema dentro de uma transação maior (ex: oferta enviada).
    pub async fn post_system_message(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, AppError> {
        self.repo.add_message(conn, conversation_id, sender_id, body).await
    }

    pub async fn find_conversation(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
    ) -> Result<Option<Conversation>, AppError> {
        self.repo.find_by_id(conn, conversation_id).await
    }

    pub async fn list_messages(&self, user_id: Uuid, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        let conversation = self.conversation_for(user_id, conversation_id).await?;
        self.repo.list_messages(conversation.id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, conversation_id: Uuid) -> Result<u64, AppError> {
        let conversation = self.conversation_for(user_id, conversation_id).await?;
        self.repo.mark_read(conversation.id, user_id).await
    }
}
