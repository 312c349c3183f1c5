// src/middleware/auth.rs

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::User,
};

// Usuário autenticado, colocado nas extensions pelo `auth_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Usuário com `is_admin`. Usado nas rotas de moderação.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let user = app_state.auth_service.validate_token(bearer.token()).await?;

    if user.is_suspended {
        tracing::warn!("Acesso negado para usuário suspenso {}", user.id);
        return Err(AppError::AccountSuspended);
    }

    Ok(user)
}

// Middleware: exige `Authorization: Bearer <jwt>` válido.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let locale = Locale::from_headers(request.headers());

    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Middleware: autenticação + `X-Tenant-ID` de uma empresa da qual o usuário é membro.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let locale = Locale::from_headers(request.headers());
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).await.map_err(to_api)?;
    let tenant = TenantContext::from_headers(request.headers()).map_err(to_api)?;

    let is_member = app_state
        .tenancy_repo
        .check_user_tenancy(user.id, tenant.0)
        .await
        .map_err(to_api)?;

    if !is_member {
        return Err(to_api(AppError::TenantAccessDenied));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::AdminOnly);
        }
        Ok(AdminUser(user))
    }
}

impl AdminUser {
    pub fn as_authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser(self.0.clone())
    }
}
