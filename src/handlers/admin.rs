// src/handlers/admin.rs
//
// Moderação: só `AdminUser` chega aqui.

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
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::begin_admin_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AdminUser, i18n::Locale},
    models::{
        auth::User,
        billing::SubscriptionPlan,
        fx::ExchangeRate,
        money::{validate_currency, validate_money, Price},
        product::{Product, ProductStatus},
        sourcing::SourcingRequest,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 1000, message = "validation.required"))]
    #[schema(example = "Imagens de terceiros sem autorização")]
    pub reason: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductStatusQuery {
    /// Padrão: `pending_review`
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRatePayload {
    #[validate(custom(function = "validate_positive_rate"))]
    #[schema(example = "5.4321")]
    pub rate_per_usd: Decimal,
}

fn validate_positive_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.positive".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanPayload {
    #[validate(length(min = 1, max = 80, message = "validation.required"))]
    #[schema(example = "Pro")]
    pub name: String,

    #[validate(length(max = 1000, message = "validation.too_long"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_money"))]
    #[schema(example = "49.00")]
    pub price_amount: Decimal,

    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "USD")]
    pub price_currency: String,

    #[validate(range(min = 1, message = "validation.positive"))]
    #[schema(example = 30)]
    pub duration_days: i32,

    #[validate(range(min = 1, message = "validation.positive"))]
    #[schema(example = 100)]
    pub max_listings: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// =============================================================================
//  ANÚNCIOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "Admin",
    params(ProductStatusQuery),
    responses(
        (status = 200, description = "Anúncios no status pedido", body = Vec<Product>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Query(query): Query<ProductStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_admin_transaction(&app_state, &admin.as_authenticated())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .product_service
        .list_by_status(&mut *tx, query.status.unwrap_or(ProductStatus::PendingReview))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

async fn review_product(
    app_state: &AppState,
    admin: &AdminUser,
    product_id: Uuid,
    next: ProductStatus,
    reason: Option<&str>,
) -> Result<Product, AppError> {
    let mut tx = begin_admin_transaction(app_state, &admin.as_authenticated()).await?;
    let product = app_state
        .product_service
        .review_product(&mut *tx, product_id, next, reason)
        .await?;
    tx.commit().await?;
    Ok(product)
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    responses(
        (status = 200, description = "Anúncio publicado", body = Product),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_product(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = review_product(&app_state, &admin, id, ProductStatus::Active, None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Anúncio rejeitado", body = Product),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_product(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = review_product(&app_state, &admin, id, ProductStatus::Rejected, Some(payload.reason.trim()))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// =============================================================================
//  PEDIDOS DE COTAÇÃO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/sourcing",
    tag = "Admin",
    responses((status = 200, description = "Pedidos aguardando aprovação", body = Vec<SourcingRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending_sourcing(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .sourcing_service
        .list_pending()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

#[utoipa::path(
    post,
    path = "/api/admin/sourcing/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido ativo", body = SourcingRequest),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_sourcing(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .sourcing_service
        .approve(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/admin/sourcing/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Pedido fechado", body = SourcingRequest),
        (status = 409, description = "Só pedidos pendentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_sourcing(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .sourcing_service
        .reject(id, payload.reason.trim())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// =============================================================================
//  CÂMBIO
// =============================================================================

#[utoipa::path(
    put,
    path = "/api/admin/fx/rates/{currency}",
    tag = "Admin",
    params(("currency" = String, Path, description = "Código ISO 4217")),
    request_body = UpsertRatePayload,
    responses(
        (status = 200, description = "Cotação gravada", body = ExchangeRate),
        (status = 400, description = "Moeda ou cotação inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_rate(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Path(currency): Path<String>,
    Json(payload): Json<UpsertRatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    validate_currency(&currency)
        .map_err(|_| AppError::field("currency", "validation.currency"))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_admin_transaction(&app_state, &admin.as_authenticated())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rate = app_state
        .fx_service
        .upsert_rate(&mut *tx, &currency, payload.rate_per_usd)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rate))
}

// =============================================================================
//  PLANOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/admin/plans",
    tag = "Admin",
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano criado", body = SubscriptionPlan),
        (status = 409, description = "Nome já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plan = app_state
        .billing_service
        .create_plan(
            &payload.name,
            payload.description.as_deref(),
            &Price::new(payload.price_amount, &payload.price_currency),
            payload.duration_days,
            payload.max_listings,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    post,
    path = "/api/admin/plans/{id}/activate",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses((status = 200, description = "Plano à venda", body = SubscriptionPlan)),
    security(("api_jwt" = []))
)]
pub async fn activate_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .billing_service
        .set_plan_active(id, true)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plan))
}

#[utoipa::path(
    post,
    path = "/api/admin/plans/{id}/deactivate",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses((status = 200, description = "Plano fora de venda; assinaturas vigentes continuam", body = SubscriptionPlan)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .billing_service
        .set_plan_active(id, false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plan))
}

// =============================================================================
//  USUÁRIOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(PageQuery),
    responses((status = 200, description = "Usuários, mais recentes primeiro", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AdminUser,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = page.limit.unwrap_or(50).clamp(1, 200);
    let offset = page.offset.unwrap_or(0).max(0);

    let users = app_state
        .user_repo
        .list_users(&app_state.db_pool, limit, offset)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

async fn set_suspended(app_state: &AppState, admin: &AdminUser, user_id: Uuid, suspended: bool) -> Result<User, AppError> {
    if user_id == admin.0.id {
        return Err(AppError::Conflict("um administrador não pode suspender a si mesmo".into()));
    }

    let user = app_state
        .user_repo
        .set_suspended(&app_state.db_pool, user_id, suspended)
        .await?
        .ok_or(AppError::UserNotFound)?;

    tracing::info!("🚫 Usuário {} suspenso={} por {}", user.id, suspended, admin.0.id);
    Ok(user)
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/suspend",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 200, description = "Usuário suspenso", body = User)),
    security(("api_jwt" = []))
)]
pub async fn suspend_user(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = set_suspended(&app_state, &admin, id, true)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/unsuspend",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses((status = 200, description = "Usuário reativado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn unsuspend_user(
    State(app_state): State<AppState>,
    locale: Locale,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = set_suspended(&app_state, &admin, id, false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_must_be_strictly_positive() {
        assert!(UpsertRatePayload { rate_per_usd: Decimal::new(54321, 4) }.validate().is_ok());
        assert!(UpsertRatePayload { rate_per_usd: Decimal::ZERO }.validate().is_err());
        assert!(UpsertRatePayload { rate_per_usd: Decimal::NEGATIVE_ONE }.validate().is_err());
    }

    fn plan(price_amount: Decimal) -> CreatePlanPayload {
        CreatePlanPayload {
            name: "Pro".into(),
            description: None,
            price_amount,
            price_currency: "USD".into(),
            duration_days: 30,
            max_listings: 100,
        }
    }

    #[test]
    fn plan_price_must_be_a_storable_amount() {
        assert!(plan(Decimal::new(4900, 2)).validate().is_ok());
        assert!(plan(Decimal::ZERO).validate().is_ok());

        for bad in [Decimal::new(49999, 3), Decimal::MAX, Decimal::NEGATIVE_ONE] {
            let errors = plan(bad).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("price_amount"), "{bad}");
        }
    }
}
