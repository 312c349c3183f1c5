// src/handlers/fx.rs

use axum::{extract::State, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        fx::ExchangeRate,
        money::{validate_currency, validate_money, Price},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPayload {
    #[validate(custom(function = "validate_money"))]
    #[schema(example = "100.00")]
    pub amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "EUR")]
    pub from: String,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "BRL")]
    pub to: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub original: Price,
    /// Se faltar cotação, volta o valor original na moeda de origem
    pub converted: Price,
}

#[utoipa::path(
    get,
    path = "/api/fx/rates",
    tag = "FX",
    responses((status = 200, description = "Cotações por USD", body = Vec<ExchangeRate>))
)]
pub async fn list_rates(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let rates = app_state
        .fx_service
        .list_rates()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rates))
}

#[utoipa::path(
    post,
    path = "/api/fx/convert",
    tag = "FX",
    request_body = ConvertPayload,
    responses(
        (status = 200, description = "Valor convertido via USD", body = ConvertResponse),
        (status = 400, description = "Moeda inválida")
    )
)]
pub async fn convert(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ConvertPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let original = Price::new(payload.amount, &payload.from);
    let converted = app_state
        .fx_service
        .convert(&original, &payload.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ConvertResponse { original, converted }))
}
