use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common_auth::{AccessResolver, AuthError, AuthResult, ResolvedAccess};

use crate::store::{CredentialStore, StoreResult};

/// Flattens a user's role assignments into the role and permission name
/// sets carried by the request context.
pub struct PermissionResolver {
    store: Arc<dyn CredentialStore>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Roles come back in assignment order; permissions are the union across
    /// those roles, de-duplicated by name in first-seen order. A user with
    /// no roles resolves to two empty lists, which every guard then denies.
    pub async fn roles_and_permissions(&self, user_id: Uuid) -> StoreResult<ResolvedAccess> {
        let roles = self.store.find_roles_for_user(user_id).await?;

        let mut role_names = Vec::with_capacity(roles.len());
        let mut permissions: Vec<String> = Vec::new();
        for role in &roles {
            role_names.push(role.name.clone());
            for permission in self.store.find_permissions_for_role(role.id).await? {
                if !permissions.iter().any(|name| *name == permission.name) {
                    permissions.push(permission.name);
                }
            }
        }

        Ok(ResolvedAccess {
            roles: role_names,
            permissions,
        })
    }
}

#[async_trait]
impl AccessResolver for PermissionResolver {
    async fn resolve_access(&self, user_id: Uuid) -> AuthResult<ResolvedAccess> {
        self.roles_and_permissions(user_id)
            .await
            .map_err(|err| AuthError::Internal(format!("access resolution failed: {err}")))
    }
}
