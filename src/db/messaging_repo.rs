// src/db/messaging_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::messaging::{Conversation, Message},
};

#[derive(Clone)]
pub struct MessagingRepository {
    pool: PgPool,
}

impl MessagingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre a conversa ou devolve a que já existe para o mesmo trio produto/comprador/vendedor.
    pub async fn open_conversation<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<Conversation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O DO UPDATE "vazio" faz o RETURNING devolver a linha existente
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (product_id, buyer_id, seller_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, buyer_id, seller_id)
            DO UPDATE SET product_id = EXCLUDED.product_id
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_one(executor)
        .await?;

        Ok(conversation)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Conversation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversation = sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(conversation)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT * FROM conversations
            WHERE buyer_id = $1 OR seller_id = $1
            ORDER BY COALESCE(last_message_at, created_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    pub async fn add_message<'e, E>(
        &self,
        executor: E,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // CTE: grava a mensagem e atualiza o "última mensagem" na mesma query
        let message = sqlx::query_as::<_, Message>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (conversation_id, sender_id, body)
                VALUES ($1, $2, $3)
                RETURNING *
            ), touched AS (
                UPDATE conversations SET last_message_at = NOW() WHERE id = $1
            )
            SELECT * FROM inserted
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(executor)
        .await?;

        Ok(message)
    }

    pub async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Marca como lidas as mensagens que o `reader` recebeu.
    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
