use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{CredentialStore, Permission, Role, StoreError, StoreResult, UserRecord};

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    /// (user_id, role_id) pairs in assignment order.
    user_roles: Vec<(Uuid, Uuid)>,
    /// (role_id, permission_id) pairs in grant order.
    role_permissions: Vec<(Uuid, Uuid)>,
}

/// In-memory [`CredentialStore`] used by tests. Insertion order of the join
/// tables doubles as assignment/grant order, matching what the Postgres
/// store derives from its timestamp columns.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: UserRecord) {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        inner.users.push(user);
    }

    pub fn assign_role(&self, user_id: Uuid, role_id: Uuid) {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        inner.user_roles.push((user_id, role_id));
    }

    pub fn remove_user(&self, user_id: Uuid) {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        inner.users.retain(|user| user.id != user_id);
    }

    pub fn set_user_active(&self, user_id: Uuid, active: bool) {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        if let Some(user) = inner.users.iter_mut().find(|user| user.id == user_id) {
            user.is_active = active;
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        Ok(inner
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Role>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        let roles = inner
            .user_roles
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, role_id)| inner.roles.iter().find(|role| role.id == *role_id))
            .cloned()
            .collect();
        Ok(roles)
    }

    async fn find_permissions_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Permission>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        let permissions = inner
            .role_permissions
            .iter()
            .filter(|(role, _)| *role == role_id)
            .filter_map(|(_, permission_id)| {
                inner
                    .permissions
                    .iter()
                    .find(|permission| permission.id == *permission_id)
            })
            .cloned()
            .collect();
        Ok(permissions)
    }

    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        Ok(inner
            .permissions
            .iter()
            .find(|permission| permission.name == name)
            .cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        Ok(inner.roles.iter().find(|role| role.name == name).cloned())
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        let inner = self.inner.read().expect("rwlock poisoned");
        let mut permissions = inner.permissions.clone();
        permissions.sort_by(|a, b| (&a.category, &a.action).cmp(&(&b.category, &b.action)));
        Ok(permissions)
    }

    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        action: &str,
    ) -> StoreResult<Permission> {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        if inner.permissions.iter().any(|existing| existing.name == name) {
            return Err(StoreError::Conflict(format!(
                "permission '{name}' already exists"
            )));
        }

        let now = Utc::now();
        let permission = Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            category: category.to_string(),
            action: action.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn create_role(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
        is_system: bool,
    ) -> StoreResult<Role> {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        if inner.roles.iter().any(|existing| existing.name == name) {
            return Err(StoreError::Conflict(format!("role '{name}' already exists")));
        }

        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            is_default,
            is_system,
            created_at: now,
            updated_at: now,
        };
        inner.roles.push(role.clone());
        Ok(role)
    }

    async fn create_role_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        let pair = (role_id, permission_id);
        if !inner.role_permissions.contains(&pair) {
            inner.role_permissions.push(pair);
        }
        Ok(())
    }

    async fn update_role(&self, id: Uuid, description: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("rwlock poisoned");
        if let Some(role) = inner.roles.iter_mut().find(|role| role.id == id) {
            role.description = Some(description.to_string());
            role.updated_at = Utc::now();
        }
        Ok(())
    }
}
