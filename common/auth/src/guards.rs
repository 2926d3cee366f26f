use tracing::warn;

use crate::error::{AuthError, AuthResult};
use crate::extractors::AuthContext;
use crate::roles::ROLE_ADMIN;

/// Passes when the caller holds any of the allowed roles. An empty list
/// places no restriction.
///
/// Denials map to 401 while the permission guards map to 403; clients tell
/// the two checks apart by status code, so the split is part of the
/// contract.
pub fn ensure_role(auth: &AuthContext, allowed: &[&str]) -> AuthResult<()> {
    if allowed.is_empty() {
        return Ok(());
    }

    let has_role = auth
        .roles
        .iter()
        .any(|role| allowed.iter().any(|required| role == required));

    if has_role {
        return Ok(());
    }

    warn!(user_id = %auth.id, required = ?allowed, "role check denied request");
    Err(AuthError::Unauthorized("Insufficient permissions"))
}

/// Passes when the caller holds the named permission.
pub fn ensure_permission(auth: &AuthContext, required: &str) -> AuthResult<()> {
    ensure_any_permission(auth, &[required])
}

/// Passes when the caller holds at least one of the named permissions.
pub fn ensure_any_permission(auth: &AuthContext, required: &[&str]) -> AuthResult<()> {
    if required.iter().any(|name| auth.has_permission(name)) {
        return Ok(());
    }

    warn!(user_id = %auth.id, required = ?required, "permission check denied request");
    Err(AuthError::Forbidden("Insufficient permissions"))
}

/// Passes only for holders of the admin role.
pub fn ensure_admin(auth: &AuthContext) -> AuthResult<()> {
    if auth.has_role(ROLE_ADMIN) {
        return Ok(());
    }

    warn!(user_id = %auth.id, "admin check denied request");
    Err(AuthError::Forbidden("Admin access required"))
}
