// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
};

/// Uma permissão nomeada por um slug global (`módulo:ação`).
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Guardião: só deixa passar quem tem a permissão `T` na empresa do `X-Tenant-ID`.
/// Depende de `tenant_guard` ter rodado antes.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)
            .map_err(to_api)?;

        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or(AppError::TenantHeaderMissing)
            .map_err(to_api)?;

        let required_perm = T::slug();

        let has_permission = app_state
            .rbac_repo
            .user_has_permission(user.0.id, tenant.0, required_perm)
            .await
            .map_err(to_api)?;

        if !has_permission {
            return Err(to_api(AppError::PermissionDenied(required_perm.to_string())));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// PERMISSÕES
// ---

pub struct PermProductsWrite;
impl PermissionDef for PermProductsWrite {
    fn slug() -> &'static str { "products:write" }
}

pub struct PermOffersWrite;
impl PermissionDef for PermOffersWrite {
    fn slug() -> &'static str { "offers:write" }
}

pub struct PermSourcingQuote;
impl PermissionDef for PermSourcingQuote {
    fn slug() -> &'static str { "sourcing:quote" }
}

pub struct PermBillingManage;
impl PermissionDef for PermBillingManage {
    fn slug() -> &'static str { "billing:manage" }
}

pub struct PermRolesWrite;
impl PermissionDef for PermRolesWrite {
    fn slug() -> &'static str { "roles:write" }
}
