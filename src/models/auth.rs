// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "compras@acme.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Maria Souza")]
    pub display_name: String,
    pub is_admin: bool,
    pub is_suspended: bool,

    // Preenchidos pelo webhook de pagamento
    pub subscription_plan_id: Option<Uuid>,
    pub subscription_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription_plan_id.is_some()
            && self.subscription_expires_at.is_some_and(|exp| exp > now)
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "compras@acme.com")]
    pub email: String,
    #[validate(length(min = 8, message = "validation.password_length"))]
    pub password: String,
    #[validate(length(min = 1, max = 120, message = "validation.required"))]
    #[schema(example = "Maria Souza")]
    pub display_name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(plan: Option<Uuid>, expires_at: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            password_hash: String::new(),
            display_name: "A".into(),
            is_admin: false,
            is_suspended: false,
            subscription_plan_id: plan,
            subscription_expires_at: expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn subscription_is_active_only_before_expiry() {
        let now = Utc::now();
        let plan = Some(Uuid::new_v4());
        assert!(user(plan, Some(now + Duration::days(1))).has_active_subscription(now));
        assert!(!user(plan, Some(now - Duration::seconds(1))).has_active_subscription(now));
        assert!(!user(None, Some(now + Duration::days(1))).has_active_subscription(now));
        assert!(!user(plan, None).has_active_subscription(now));
    }
}
