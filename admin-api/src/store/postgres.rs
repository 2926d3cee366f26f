use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, Permission, Role, StoreResult, UserRecord};

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, full_name, is_active, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, full_name, is_active, created_at, updated_at
             FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT r.id, r.name, r.description, r.is_default, r.is_system, r.created_at, r.updated_at
             FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY ur.created_at, r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn find_permissions_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.description, p.category, p.action, p.created_at, p.updated_at
             FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.id
             WHERE rp.role_id = $1
             ORDER BY rp.created_at, p.name",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, action, created_at, updated_at
             FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, is_default, is_system, created_at, updated_at
             FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, action, created_at, updated_at
             FROM permissions ORDER BY category, action",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        action: &str,
    ) -> StoreResult<Permission> {
        let permission = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (id, name, description, category, action)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, category, action, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(action)
        .fetch_one(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn create_role(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
        is_system: bool,
    ) -> StoreResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, description, is_default, is_system)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, is_default, is_system, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(is_default)
        .bind(is_system)
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    async fn create_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_role(&self, id: Uuid, description: &str) -> StoreResult<()> {
        sqlx::query("UPDATE roles SET description = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
