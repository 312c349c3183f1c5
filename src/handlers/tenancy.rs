// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
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
        rbac::{PermBillingManage, PermRolesWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        billing::SubscriptionStatus,
        tenancy::{Tenant, TenantMember},
    },
};

fn validate_country(code: &str) -> Result<(), validator::ValidationError> {
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("country");
    err.message = Some("validation.country".into());
    Err(err)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, max = 120, message = "validation.required"))]
    #[schema(example = "Acme Industrial Ltda")]
    pub name: String,
    #[validate(length(max = 2000, message = "validation.too_long"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_country"))]
    #[schema(example = "BR")]
    pub country_code: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Empresa criada; quem criou vira dono", body = Tenant),
        (status = 409, description = "Nome repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let country = payload.country_code.as_deref().map(str::to_ascii_uppercase);

    let new_tenant = app_state
        .tenant_service
        .create_tenant_with_owner(
            payload.name.trim(),
            payload.description.as_deref(),
            country.as_deref(),
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(new_tenant)))
}

#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses((status = 200, description = "Empresas do usuário", body = Vec<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let tenants = app_state
        .tenant_service
        .list_user_tenants(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tenants))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/tenants/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro adicionado", body = TenantMember),
        (status = 409, description = "Já é membro")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermRolesWrite>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let member = app_state
        .tenant_service
        .add_member(tenant.0, payload.user_id, payload.role_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/api/tenants/subscription",
    tag = "Tenancy",
    responses((status = 200, description = "Assinatura do dono, que vale para a empresa", body = SubscriptionStatus)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn get_tenant_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermBillingManage>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .billing_service
        .tenant_subscription(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}
