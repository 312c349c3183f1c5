// src/handlers/messaging.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::messaging::{Conversation, Message, MAX_MESSAGE_LEN},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationPayload {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostMessagePayload {
    #[validate(
        length(max = MAX_MESSAGE_LEN, message = "validation.too_long"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Conseguem entregar em 15 dias?")]
    pub body: String,
}

fn validate_not_blank(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("validation.required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub marked: u64,
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Messaging",
    request_body = OpenConversationPayload,
    responses(
        (status = 200, description = "Conversa com o vendedor do anúncio", body = Conversation),
        (status = 404, description = "Anúncio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_conversation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<OpenConversationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .find_active(payload.product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let conversation = app_state
        .messaging_service
        .open_conversation(user.0.id, &product)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(conversation))
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Messaging",
    responses((status = 200, description = "Conversas do usuário", body = Vec<Conversation>)),
    security(("api_jwt" = []))
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = app_state
        .messaging_service
        .list_conversations(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(conversations))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    tag = "Messaging",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Mensagens em ordem cronológica", body = Vec<Message>),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = app_state
        .messaging_service
        .list_messages(user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    tag = "Messaging",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    request_body = PostMessagePayload,
    responses(
        (status = 201, description = "Mensagem enviada", body = Message),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn post_message(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .messaging_service
        .post_message(user.0.id, id, &payload.body)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{id}/read",
    tag = "Messaging",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses((status = 200, description = "Mensagens recebidas marcadas como lidas", body = MarkReadResponse)),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let marked = app_state
        .messaging_service
        .mark_read(user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MarkReadResponse { marked }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_must_have_content_and_fit() {
        assert!(PostMessagePayload { body: "Olá".into() }.validate().is_ok());
        assert!(PostMessagePayload { body: "   \n".into() }.validate().is_err());

        let long = "a".repeat(MAX_MESSAGE_LEN as usize + 1);
        assert!(PostMessagePayload { body: long }.validate().is_err());
    }
}
