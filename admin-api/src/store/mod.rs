mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Conflict(String),
}

/// Account row as stored. The password hash never leaves this type; response
/// payloads are built from explicit summary structs.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permission names are always `category:action`; the pair is unique.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Narrow persistence interface for the auth subsystem. Backed by Postgres
/// in production and by an in-memory table set in tests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// Email lookup is case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Roles in assignment order.
    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>>;

    /// Permissions in grant order.
    async fn find_permissions_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Permission>>;

    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>>;

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>>;

    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        action: &str,
    ) -> StoreResult<Permission>;

    async fn create_role(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
        is_system: bool,
    ) -> StoreResult<Role>;

    /// Adding a grant that already exists is a no-op.
    async fn create_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    async fn update_role(&self, id: Uuid, description: &str) -> StoreResult<()>;
}
