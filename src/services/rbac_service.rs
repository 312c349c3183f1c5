// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::{Permission, Role, RoleResponse};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn create_role_with_permissions(
        &self,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
        permission_slugs: &[String],
    ) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self.repo.create_role(&mut *tx, tenant_id, name, description).await?;

        // Todo slug pedido precisa existir.
        let permissions = self.repo.find_permissions_by_slugs(&mut *tx, permission_slugs).await?;
        if let Some(unknown) = permission_slugs
            .iter()
            .find(|slug| !permissions.iter().any(|p| &p.slug == *slug))
        {
            tracing::warn!("Permissão desconhecida no cargo '{}': {}", name, unknown);
            return Err(AppError::NotFound("permission"));
        }

        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        tx.commit().await?;

        Ok(RoleResponse {
            role,
            permissions: permissions.into_iter().map(|p| p.slug).collect(),
        })
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles(tenant_id).await
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions(&self.pool).await
    }
}
