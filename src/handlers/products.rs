// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermProductsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        money::{validate_currency, validate_money, CurrencyQuery, Price},
        product::{Product, ProductQuery, ProductView},
    },
    services::product_service::NewProduct,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    #[schema(example = "Parafuso sextavado M8 inox")]
    pub name: String,

    #[validate(length(max = 5000, message = "validation.too_long"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 80, message = "validation.required"))]
    #[schema(example = "fixadores")]
    pub category: String,

    #[validate(custom(function = "validate_money"))]
    #[schema(example = "0.35")]
    pub base_amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "USD")]
    pub base_currency: String,

    #[validate(range(min = 1, message = "validation.positive"))]
    #[serde(default = "default_min_order")]
    pub min_order_quantity: i32,

    #[validate(length(min = 1, max = 40, message = "validation.required"))]
    #[schema(example = "peça")]
    pub unit: String,
}

fn default_min_order() -> i32 {
    1
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductQuery),
    responses((status = 200, description = "Catálogo público (só ativos)", body = Vec<ProductView>))
)]
pub async fn list_catalogue(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list_catalogue(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do anúncio"), CurrencyQuery),
    responses(
        (status = 200, description = "Anúncio ativo", body = ProductView),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Query(query): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .get_public_product(id, query.currency.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/tenants/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Anúncio criado em revisão", body = Product),
        (status = 400, description = "Dados inválidos ou conteúdo recusado"),
        (status = 402, description = "Limite de anúncios do plano")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductsWrite>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_product = NewProduct {
        name: &payload.name,
        description: payload.description.as_deref(),
        category: &payload.category,
        price: Price::new(payload.base_amount, &payload.base_currency),
        min_order_quantity: payload.min_order_quantity,
        unit: &payload.unit,
    };

    app_state
        .product_service
        .moderate_listing(tenant.0, &new_product)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .create_product(&mut *tx, tenant.0, user.0.id, new_product)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/tenants/products",
    tag = "Products",
    responses((status = 200, description = "Anúncios da empresa, em qualquer status", body = Vec<Product>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_tenant_products(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .product_service
        .list_tenant_products(&mut *tx, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/tenants/products/{id}/archive",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "ID do anúncio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Anúncio arquivado", body = Product),
        (status = 409, description = "Já arquivado")
    ),
    security(("api_jwt" = []))
)]
pub async fn archive_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductsWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .archive_product(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EnhanceDescriptionPayload {
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub name: String,
    #[validate(length(min = 1, max = 5000, message = "validation.required"))]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnhanceDescriptionResponse {
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/api/tenants/products/enhance-description",
    tag = "Products",
    request_body = EnhanceDescriptionPayload,
    responses(
        (status = 200, description = "Descrição reescrita", body = EnhanceDescriptionResponse),
        (status = 503, description = "Provedor de IA não configurado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn enhance_description(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsWrite>,
    Json(payload): Json<EnhanceDescriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let description = app_state
        .product_service
        .enhance_description(&payload.name, &payload.description)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(EnhanceDescriptionResponse { description }))
}
