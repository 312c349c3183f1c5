// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, TenantRepository},
    models::tenancy::Tenant,
};

pub const OWNER_ROLE_NAME: &str = "Dono";

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, rbac_repo: RbacRepository, pool: PgPool) -> Self {
        Self { tenant_repo, rbac_repo, pool }
    }

    /// Cria a empresa e, na mesma transação, o cargo "Dono" com todas as
    /// permissões do sistema, vinculando quem criou como primeiro membro.
    pub async fn create_tenant_with_owner(
        &self,
        name: &str,
        description: Option<&str>,
        country_code: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        if self.tenant_repo.user_has_tenant_with_name(owner_id, name).await? {
            return Err(AppError::Conflict(format!("você já tem uma empresa chamada '{}'", name)));
        }

        let mut tx = self.pool.begin().await?;

        let new_tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, name, description, country_code)
            .await?;

        let owner_role = self
            .rbac_repo
            .create_role(
                &mut *tx,
                new_tenant.id,
                OWNER_ROLE_NAME,
                Some("Acesso total (gerado automaticamente)"),
            )
            .await?;

        let all_perm_ids: Vec<Uuid> = self
            .rbac_repo
            .list_all_permissions(&mut *tx)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();

        if !all_perm_ids.is_empty() {
            self.rbac_repo.assign_permissions(&mut *tx, owner_role.id, &all_perm_ids).await?;
        }

        self.tenant_repo
            .add_member_to_tenant(&mut *tx, new_tenant.id, owner_id, owner_role.id)
            .await?;

        tx.commit().await?;

        tracing::info!("🏢 Empresa {} criada por {}", new_tenant.id, owner_id);
        Ok(new_tenant)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.get_tenants_for_user(user_id).await
    }

    /// Vincula um usuário existente a um cargo da empresa.
    pub async fn add_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<crate::models::tenancy::TenantMember, AppError> {
        let mut tx = self.pool.begin().await?;

        let role_belongs = self.rbac_repo.role_belongs_to_tenant(&mut *tx, role_id, tenant_id).await?;
        if !role_belongs {
            return Err(AppError::NotFound("role"));
        }

        let member = self
            .tenant_repo
            .add_member_to_tenant(&mut *tx, tenant_id, user_id, role_id)
            .await?;

        tx.commit().await?;
        Ok(member)
    }
}
