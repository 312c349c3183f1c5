use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro interno. Os handlers convertem para `ApiError` na borda.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Conta suspensa")]
    AccountSuspended,

    #[error("Cabeçalho X-Tenant-ID ausente ou inválido")]
    TenantHeaderMissing,

    #[error("Usuário sem acesso à empresa")]
    TenantAccessDenied,

    #[error("Permissão ausente: {0}")]
    PermissionDenied(String),

    #[error("Ação não permitida: {0}")]
    Forbidden(&'static str),

    #[error("Apenas administradores")]
    AdminOnly,

    #[error("Não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Transição inválida: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Limite do plano atingido")]
    SubscriptionRequired,

    #[error("Conteúdo recusado: {0}")]
    ContentRejected(String),

    #[error("Assinatura de webhook inválida")]
    InvalidWebhookSignature,

    #[error("Erro do provedor de pagamento: {0}")]
    PaymentProvider(String),

    #[error("Erro do provedor de IA: {0}")]
    AiProvider(String),

    #[error("Provedor não configurado: {0}")]
    ProviderNotConfigured(&'static str),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que sai para o cliente: `{ success: false, error, details? }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl AppError {
    /// Erro de validação de um único campo, para regras fora do `validator`.
    pub fn field(field: &'static str, message_key: &'static str) -> Self {
        let mut err = validator::ValidationError::new("invalid");
        err.message = Some(message_key.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::ContentRejected(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidWebhookSignature | AppError::TenantHeaderMissing => {
                StatusCode::BAD_REQUEST
            }
            AppError::EmailAlreadyExists | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountSuspended
            | AppError::TenantAccessDenied
            | AppError::PermissionDenied(_)
            | AppError::Forbidden(_)
            | AppError::AdminOnly => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SubscriptionRequired => StatusCode::PAYMENT_REQUIRED,
            AppError::PaymentProvider(_) | AppError::AiProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        let error = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&*e.code);
                            store.translate(lang, key, &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status,
                    error: store.translate(lang, "error.validation", &[]),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => store.translate(lang, "error.email_exists", &[]),
            AppError::InvalidCredentials => store.translate(lang, "error.invalid_credentials", &[]),
            AppError::InvalidToken => store.translate(lang, "error.invalid_token", &[]),
            AppError::UserNotFound => store.translate(lang, "error.user_not_found", &[]),
            AppError::AccountSuspended => store.translate(lang, "error.account_suspended", &[]),
            AppError::TenantHeaderMissing => store.translate(lang, "error.tenant_header", &[]),
            AppError::TenantAccessDenied => store.translate(lang, "error.tenant_access", &[]),
            AppError::PermissionDenied(slug) => {
                store.translate(lang, "error.permission_denied", &[slug.as_str()])
            }
            AppError::Forbidden(what) => store.translate(lang, "error.forbidden", &[*what]),
            AppError::AdminOnly => store.translate(lang, "error.admin_only", &[]),
            AppError::NotFound(what) => store.translate(lang, "error.not_found", &[*what]),
            AppError::InvalidStateTransition { from, to } => {
                store.translate(lang, "error.invalid_transition", &[from.as_str(), to.as_str()])
            }
            AppError::Conflict(msg) => store.translate(lang, "error.conflict", &[msg.as_str()]),
            AppError::SubscriptionRequired => {
                store.translate(lang, "error.subscription_required", &[])
            }
            AppError::ContentRejected(reason) => {
                store.translate(lang, "error.content_rejected", &[reason.as_str()])
            }
            AppError::InvalidWebhookSignature => {
                store.translate(lang, "error.invalid_signature", &[])
            }
            AppError::PaymentProvider(msg) => {
                tracing::error!("Erro no provedor de pagamento: {}", msg);
                store.translate(lang, "error.payment_provider", &[])
            }
            AppError::AiProvider(msg) => {
                tracing::error!("Erro no provedor de IA: {}", msg);
                store.translate(lang, "error.ai_provider", &[])
            }
            AppError::ProviderNotConfigured(name) => {
                store.translate(lang, "error.provider_not_configured", &[*name])
            }
            // Todos os outros erros (banco, bcrypt, jwt, pdf, anyhow) viram 500.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(lang, "error.internal", &[])
            }
        };

        ApiError { status, error, details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": false, "error": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Usado pelos middlewares, que não têm o idioma em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::builtin())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn en() -> Locale {
        Locale("en".into())
    }

    #[test]
    fn transition_errors_are_conflicts() {
        let err = AppError::InvalidStateTransition { from: "accepted".into(), to: "declined".into() };
        let api = err.to_api_error(&en(), I18nStore::builtin());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.error, "Invalid status transition: accepted → declined.");
    }

    #[test]
    fn validation_errors_carry_translated_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("currency");
        err.message = Some("validation.currency".into());
        errors.add("baseCurrency", err);

        let api = AppError::ValidationError(errors)
            .to_api_error(&Locale("pt".into()), I18nStore::builtin());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["baseCurrency"][0], "Moeda deve ser um código ISO de 3 letras.");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo do banco"))
            .to_api_error(&en(), I18nStore::builtin());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }

    #[test]
    fn permission_denied_names_the_permission() {
        let api = AppError::PermissionDenied("offers:write".into())
            .to_api_error(&en(), I18nStore::builtin());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("offers:write"));
    }
}
