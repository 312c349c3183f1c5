// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens por idioma. As chaves são estáveis; os textos não.
const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.email_exists", "Este e-mail já está em uso."),
    ("error.invalid_credentials", "E-mail ou senha inválidos."),
    ("error.invalid_token", "Token de autenticação inválido ou ausente."),
    ("error.user_not_found", "Usuário não encontrado."),
    ("error.account_suspended", "Esta conta está suspensa."),
    ("error.tenant_header", "O cabeçalho X-Tenant-ID é obrigatório e deve ser um UUID."),
    ("error.tenant_access", "Você não tem acesso a esta empresa."),
    ("error.permission_denied", "Você precisa da permissão '{0}' para realizar esta ação."),
    ("error.forbidden", "Ação não permitida: {0}."),
    ("error.admin_only", "Ação restrita a administradores."),
    ("error.not_found", "Recurso não encontrado: {0}."),
    ("error.invalid_transition", "Transição de status inválida: {0} → {1}."),
    ("error.conflict", "Conflito: {0}"),
    ("error.subscription_required", "Seu plano atingiu o limite de anúncios. Assine um plano para continuar."),
    ("error.content_rejected", "Conteúdo recusado pela moderação: {0}"),
    ("error.invalid_signature", "Assinatura do webhook inválida."),
    ("error.payment_provider", "Falha no provedor de pagamento."),
    ("error.ai_provider", "Falha no provedor de IA."),
    ("error.provider_not_configured", "O provedor '{0}' não está configurado."),
    ("error.internal", "Ocorreu um erro inesperado."),
    ("validation.required", "Campo obrigatório."),
    ("validation.email", "O e-mail fornecido é inválido."),
    ("validation.password_length", "A senha deve ter no mínimo 8 caracteres."),
    ("validation.currency", "Moeda deve ser um código ISO de 3 letras."),
    ("validation.not_negative", "O valor não pode ser negativo."),
    ("validation.money_too_large", "O valor excede o máximo de 999999999999.99."),
    ("validation.money_scale", "O valor aceita no máximo 2 casas decimais."),
    ("validation.positive", "O valor deve ser maior que zero."),
    ("validation.too_long", "Texto muito longo."),
    ("validation.expiry_range", "A validade deve ficar entre 1 e 180 dias."),
    ("validation.self_dealing", "Você não pode negociar consigo mesmo."),
    ("validation.country", "País deve ser um código ISO de 2 letras."),
];

const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.email_exists", "This e-mail is already in use."),
    ("error.invalid_credentials", "Invalid e-mail or password."),
    ("error.invalid_token", "Missing or invalid authentication token."),
    ("error.user_not_found", "User not found."),
    ("error.account_suspended", "This account is suspended."),
    ("error.tenant_header", "The X-Tenant-ID header is required and must be a UUID."),
    ("error.tenant_access", "You do not have access to this company."),
    ("error.permission_denied", "You need the '{0}' permission to perform this action."),
    ("error.forbidden", "Action not allowed: {0}."),
    ("error.admin_only", "Only administrators can perform this action."),
    ("error.not_found", "Resource not found: {0}."),
    ("error.invalid_transition", "Invalid status transition: {0} → {1}."),
    ("error.conflict", "Conflict: {0}"),
    ("error.subscription_required", "Your plan reached its listing limit. Subscribe to a plan to continue."),
    ("error.content_rejected", "Content rejected by moderation: {0}"),
    ("error.invalid_signature", "Invalid webhook signature."),
    ("error.payment_provider", "Payment provider failure."),
    ("error.ai_provider", "AI provider failure."),
    ("error.provider_not_configured", "Provider '{0}' is not configured."),
    ("error.internal", "An unexpected error occurred."),
    ("validation.required", "This field is required."),
    ("validation.email", "The e-mail is invalid."),
    ("validation.password_length", "The password must be at least 8 characters long."),
    ("validation.currency", "Currency must be a 3-letter ISO code."),
    ("validation.not_negative", "The value cannot be negative."),
    ("validation.money_too_large", "The amount exceeds the maximum of 999999999999.99."),
    ("validation.money_scale", "The amount allows at most 2 decimal places."),
    ("validation.positive", "The value must be greater than zero."),
    ("validation.too_long", "Text is too long."),
    ("validation.expiry_range", "Expiry must be between 1 and 180 days."),
    ("validation.self_dealing", "You cannot trade with yourself."),
    ("validation.country", "Country must be a 2-letter ISO code."),
];

static BUILTIN: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

/// Mensagens traduzidas, indexadas por idioma ("pt", "en") e chave.
#[derive(Debug)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    /// Instância compartilhada, usada onde não há `AppState` (ex: middlewares).
    pub fn builtin() -> &'static I18nStore {
        &BUILTIN
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    /// Traduz `key` para `lang`, caindo para o inglês e, por fim, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str, args: &[&str]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter()
            .enumerate()
            .fold(template.to_string(), |acc, (i, arg)| {
                acc.replace(&format!("{{{}}}", i), arg)
            })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_with_arguments() {
        let store = I18nStore::new();
        let msg = store.translate("pt", "error.invalid_transition", &["accepted", "declined"]);
        assert_eq!(msg, "Transição de status inválida: accepted → declined.");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("de", "error.admin_only", &[]),
            "Only administrators can perform this action."
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "custom.message", &[]), "custom.message");
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(pt, en);
    }
}
