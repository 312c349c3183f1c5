use sqlx::{Postgres, Transaction};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

pub type Tx = Transaction<'static, Postgres>;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define as variáveis RLS (a "chave").
/// `set_config(..., true)` só vale dentro da transação, então o chamador
/// deve fazer o `commit` depois de usar.
pub(crate) async fn begin_rls_transaction(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<Tx, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_ctx.0.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Transação de moderação: o admin pode escrever em qualquer empresa.
pub(crate) async fn begin_admin_transaction(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Tx, AppError> {
    if !user.0.is_admin {
        return Err(AppError::AdminOnly);
    }

    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query("SELECT set_config('app.is_admin', 'true', true)")
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
