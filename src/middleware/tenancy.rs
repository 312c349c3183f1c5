// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::common::error::AppError;

pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// Empresa em nome da qual o usuário está agindo.
// Inserido nas extensions pelo `tenant_guard`, depois de checar o vínculo.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        headers
            .get(TENANT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(TenantContext)
            .ok_or(AppError::TenantHeaderMissing)
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Só confiamos no contexto que o guard validou.
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::TenantHeaderMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_the_tenant_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(TenantContext::from_headers(&headers).unwrap().0, id);
    }

    #[test]
    fn rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("loja-1"));
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::TenantHeaderMissing)
        ));
    }
}
