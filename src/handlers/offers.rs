// src/handlers/offers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermOffersWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        money::{validate_currency, validate_money, Price},
        offer::{Offer, OfferDecision, OfferStatus},
    },
    services::offer_service::NewOffer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferPayload {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    /// Conversa em que a oferta nasceu (opcional)
    pub conversation_id: Option<Uuid>,

    #[validate(range(min = 1, message = "validation.positive"))]
    #[schema(example = 1000)]
    pub quantity: i32,

    #[validate(custom(function = "validate_money"))]
    #[schema(example = "0.31")]
    pub price_amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "USD")]
    pub price_currency: String,

    #[validate(length(max = 2000, message = "validation.too_long"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondOfferPayload {
    pub decision: OfferDecision,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferListQuery {
    pub status: Option<OfferStatus>,
}

#[utoipa::path(
    post,
    path = "/api/tenants/offers",
    tag = "Offers",
    request_body = CreateOfferPayload,
    responses(
        (status = 201, description = "Oferta enviada ao comprador", body = Offer),
        (status = 404, description = "Anúncio, comprador ou conversa não encontrados")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermOffersWrite>,
    Json(payload): Json<CreateOfferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let offer = app_state
        .offer_service
        .create_offer(
            user.0.id,
            tenant.0,
            NewOffer {
                product_id: payload.product_id,
                buyer_id: payload.buyer_id,
                conversation_id: payload.conversation_id,
                quantity: payload.quantity,
                price: Price::new(payload.price_amount, &payload.price_currency),
                notes: payload.notes.as_deref(),
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(offer)))
}

#[utoipa::path(
    get,
    path = "/api/offers",
    tag = "Offers",
    params(OfferListQuery),
    responses((status = 200, description = "Ofertas em que o usuário participa", body = Vec<Offer>)),
    security(("api_jwt" = []))
)]
pub async fn list_offers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<OfferListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = app_state
        .offer_service
        .list_offers(user.0.id, query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offers))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}",
    tag = "Offers",
    params(("id" = Uuid, Path, description = "ID da oferta")),
    responses(
        (status = 200, description = "Oferta", body = Offer),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let offer = app_state
        .offer_service
        .get_offer(user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offer))
}

#[utoipa::path(
    post,
    path = "/api/offers/{id}/respond",
    tag = "Offers",
    params(("id" = Uuid, Path, description = "ID da oferta")),
    request_body = RespondOfferPayload,
    responses(
        (status = 200, description = "Oferta aceita ou recusada", body = Offer),
        (status = 403, description = "Só o comprador responde"),
        (status = 409, description = "A oferta já foi respondida")
    ),
    security(("api_jwt" = []))
)]
pub async fn respond_to_offer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondOfferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let offer = app_state
        .offer_service
        .respond_to_offer(user.0.id, id, payload.decision)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(offer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(price_amount: Decimal) -> CreateOfferPayload {
        CreateOfferPayload {
            product_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            conversation_id: None,
            quantity: 1000,
            price_amount,
            price_currency: "USD".into(),
            notes: None,
        }
    }

    #[test]
    fn offer_price_is_bounded_and_in_cents() {
        assert!(offer(Decimal::new(31, 2)).validate().is_ok());
        assert!(offer(Decimal::new(310, 3)).validate().is_ok());

        let sub_cent = offer(Decimal::new(315, 3)).validate().unwrap_err();
        assert!(sub_cent.field_errors().contains_key("price_amount"));

        let huge = offer(Decimal::from(1_000_000_000_000_i64)).validate().unwrap_err();
        assert!(huge.field_errors().contains_key("price_amount"));
    }
}
