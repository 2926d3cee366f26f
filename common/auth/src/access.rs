use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthResult;

/// Role and permission names resolved for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Role names in assignment order.
    pub roles: Vec<String>,
    /// De-duplicated permission names, first-seen order.
    pub permissions: Vec<String>,
}

/// Source of role and permission data consulted while building an
/// [`AuthContext`](crate::AuthContext). Implemented by the service's
/// permission resolver; kept as a trait so this crate stays free of any
/// storage dependency.
#[async_trait]
pub trait AccessResolver: Send + Sync {
    async fn resolve_access(&self, user_id: Uuid) -> AuthResult<ResolvedAccess>;
}
