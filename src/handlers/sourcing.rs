// src/handlers/sourcing.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSourcingQuote, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        money::{validate_currency, validate_money, CurrencyQuery, Price},
        sourcing::{QuoteView, SourcingQuote, SourcingRequest},
    },
    services::sourcing_service::{NewQuote, NewSourcingRequest},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSourcingPayload {
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    #[schema(example = "Caixas de papelão 40x30x20")]
    pub title: String,

    #[validate(length(max = 5000, message = "validation.too_long"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 80, message = "validation.required"))]
    pub category: String,

    #[validate(range(min = 1, message = "validation.positive"))]
    pub quantity: i32,

    #[validate(length(min = 1, max = 40, message = "validation.required"))]
    pub unit: String,

    #[validate(custom(function = "validate_money"))]
    pub target_amount: Option<Decimal>,

    #[validate(custom(function = "validate_currency"))]
    pub target_currency: Option<String>,

    /// Padrão 30, máximo 180
    #[schema(example = 30)]
    pub expires_in_days: Option<i64>,
}

impl CreateSourcingPayload {
    // Preço-alvo só vale com valor e moeda juntos.
    fn target_price(&self) -> Result<Option<Price>, AppError> {
        match (self.target_amount, self.target_currency.as_deref()) {
            (Some(amount), Some(currency)) => Ok(Some(Price::new(amount, currency))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(AppError::field("targetCurrency", "validation.required")),
            (None, Some(_)) => Err(AppError::field("targetAmount", "validation.required")),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuotePayload {
    #[validate(custom(function = "validate_money"))]
    #[schema(example = "0.42")]
    pub price_amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "EUR")]
    pub price_currency: String,

    #[validate(range(min = 1, message = "validation.positive"))]
    pub quantity: i32,

    #[validate(length(max = 2000, message = "validation.too_long"))]
    pub message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/sourcing",
    tag = "Sourcing",
    request_body = CreateSourcingPayload,
    responses(
        (status = 201, description = "Pedido criado, aguardando aprovação", body = SourcingRequest),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSourcingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let target_price = payload
        .target_price()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .sourcing_service
        .create_request(
            user.0.id,
            NewSourcingRequest {
                title: &payload.title,
                description: payload.description.as_deref(),
                category: &payload.category,
                quantity: payload.quantity,
                unit: &payload.unit,
                target_price,
                expires_in_days: payload.expires_in_days,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/sourcing",
    tag = "Sourcing",
    responses((status = 200, description = "Pedidos ativos", body = Vec<SourcingRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_active(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .sourcing_service
        .list_active()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/sourcing/mine",
    tag = "Sourcing",
    responses((status = 200, description = "Pedidos do comprador, em qualquer status", body = Vec<SourcingRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .sourcing_service
        .list_mine(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/sourcing/{id}",
    tag = "Sourcing",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido, com o status efetivo", body = SourcingRequest),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .sourcing_service
        .get_request(&user.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/sourcing/{id}/close",
    tag = "Sourcing",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido encerrado", body = SourcingRequest),
        (status = 409, description = "Pedido já encerrado ou expirado")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .sourcing_service
        .close(user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    get,
    path = "/api/sourcing/{id}/quotes",
    tag = "Sourcing",
    params(("id" = Uuid, Path, description = "ID do pedido"), CurrencyQuery),
    responses((status = 200, description = "Cotações recebidas", body = Vec<QuoteView>)),
    security(("api_jwt" = []))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = app_state
        .sourcing_service
        .list_quotes(&user.0, id, query.currency.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(quotes))
}

#[utoipa::path(
    post,
    path = "/api/tenants/sourcing/{id}/quotes",
    tag = "Sourcing",
    request_body = SubmitQuotePayload,
    params(
        ("id" = Uuid, Path, description = "ID do pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 201, description = "Cotação enviada", body = SourcingQuote),
        (status = 409, description = "O pedido não aceita cotações")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSourcingQuote>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let quote = app_state
        .sourcing_service
        .submit_quote(
            user.0.id,
            tenant.0,
            id,
            NewQuote {
                price: Price::new(payload.price_amount, &payload.price_currency),
                quantity: payload.quantity,
                message: payload.message.as_deref(),
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(quote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(amount: Option<Decimal>, currency: Option<&str>) -> CreateSourcingPayload {
        CreateSourcingPayload {
            title: "Caixas".into(),
            description: None,
            category: "embalagens".into(),
            quantity: 500,
            unit: "un".into(),
            target_amount: amount,
            target_currency: currency.map(String::from),
            expires_in_days: None,
        }
    }

    #[test]
    fn target_amount_must_fit_a_money_column() {
        assert!(payload(Some(Decimal::new(125, 2)), Some("EUR")).validate().is_ok());

        let too_large = payload(Some(Decimal::from(10_000_000_000_000_i64)), Some("EUR"));
        assert!(too_large.validate().unwrap_err().field_errors().contains_key("target_amount"));

        let sub_cent = payload(Some(Decimal::new(5, 3)), Some("EUR"));
        assert!(sub_cent.validate().is_err());
    }

    #[test]
    fn target_price_requires_amount_and_currency_together() {
        assert!(payload(None, None).target_price().unwrap().is_none());

        let price = payload(Some(Decimal::new(42, 2)), Some("eur")).target_price().unwrap().unwrap();
        assert_eq!(price.base_currency, "EUR");

        assert!(matches!(
            payload(Some(Decimal::ONE), None).target_price(),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(payload(None, Some("USD")).target_price(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn invalid_currency_fails_validation() {
        let p = payload(Some(Decimal::ONE), Some("dollars"));
        assert!(p.validate().is_err());
    }
}
