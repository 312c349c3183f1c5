// src/services/ai_service.rs

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 1024;

const MODERATION_PROMPT: &str = "Você modera anúncios de um marketplace B2B. \
Responda apenas com JSON no formato {\"flagged\": bool, \"reason\": string|null}. \
Marque como flagged conteúdo ilegal, fraudulento, ofensivo ou dados pessoais expostos.";

const ENHANCE_PROMPT: &str = "Você escreve descrições de produtos para compradores B2B. \
Reescreva a descrição de forma clara e objetiva, sem inventar especificações. \
Responda apenas com o texto da descrição.";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub flagged: bool,
    pub reason: Option<String>,
}

impl ModerationResult {
    pub fn allowed() -> Self {
        Self { flagged: false, reason: None }
    }
}

/// Cliente do provedor de IA. Sem chave configurada, moderação libera tudo.
#[derive(Clone)]
pub struct AiService {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl AiService {
    pub fn new(api_key: Option<String>, model: String) -> Result<Self, AppError> {
        if api_key.is_none() {
            tracing::info!("AI_API_KEY não definida: moderação automática desativada");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        Ok(Self { client, api_key, model })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, system: &str, prompt: String) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or(AppError::ProviderNotConfigured("ai"))?;

        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiProvider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::AiProvider(format!("{}: {}", status, error_text)));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiProvider(e.to_string()))?;

        body.content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| AppError::AiProvider("resposta vazia".into()))
    }

    /// Falha do provedor não bloqueia o anúncio: fica registrada e o conteúdo passa.
    pub async fn moderate(&self, text: &str) -> ModerationResult {
        if !self.is_configured() {
            return ModerationResult::allowed();
        }

        match self.complete(MODERATION_PROMPT, text.to_string()).await {
            Ok(raw) => parse_moderation(&raw).unwrap_or_else(|| {
                tracing::warn!("Resposta de moderação ilegível: {}", raw.chars().take(200).collect::<String>());
                ModerationResult::allowed()
            }),
            Err(e) => {
                tracing::warn!("Moderação indisponível, conteúdo liberado: {}", e);
                ModerationResult::allowed()
            }
        }
    }

    pub async fn enhance_description(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, AppError> {
        let prompt = format!("Produto: {}\nDescrição atual:\n{}", name, description);
        let text = self.complete(ENHANCE_PROMPT, prompt).await?;
        Ok(text.trim().to_string())
    }
}

// Aceita a resposta crua ou cercada por ```json.
fn strip_code_fences(text: &str) -> &str {
    let cleaned = text.trim();
    if !cleaned.starts_with("```") {
        return cleaned;
    }
    let start = cleaned.find('\n').map(|i| i + 1).unwrap_or(cleaned.len());
    let end = cleaned[start..].rfind("```").map(|i| i + start).unwrap_or(cleaned.len());
    cleaned[start..end].trim()
}

fn parse_moderation(raw: &str) -> Option<ModerationResult> {
    serde_json::from_str(strip_code_fences(raw)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"flagged\": true, \"reason\": \"venda de armas\"}\n```";
        assert_eq!(
            parse_moderation(raw),
            Some(ModerationResult { flagged: true, reason: Some("venda de armas".into()) })
        );
    }

    #[test]
    fn parses_bare_json_without_reason() {
        assert_eq!(parse_moderation("{\"flagged\": false}"), Some(ModerationResult::allowed()));
    }

    #[test]
    fn garbage_is_not_a_verdict() {
        assert_eq!(parse_moderation("claro! aqui está"), None);
    }

    #[tokio::test]
    async fn without_a_key_everything_is_allowed() {
        let ai = AiService::new(None, DEFAULT_MODEL.into()).unwrap();
        assert_eq!(ai.moderate("qualquer coisa").await, ModerationResult::allowed());
        assert!(matches!(
            ai.enhance_description("Parafuso", "bom").await,
            Err(AppError::ProviderNotConfigured("ai"))
        ));
    }
}
