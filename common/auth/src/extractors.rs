use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use serde::Serialize;
use uuid::Uuid;

use crate::access::AccessResolver;
use crate::error::{AuthError, AuthResult};
use crate::tokens::TokenService;

/// Verified identity for one request: the token subject plus the roles and
/// permissions resolved for it. Built once during extraction and immutable
/// afterwards; a handler only ever sees a fully populated context.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|value| value == role)
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|value| value == name)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<TokenService>: FromRef<S>,
    Arc<dyn AccessResolver>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let resolver = Arc::<dyn AccessResolver>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let claims = tokens.verify_access(&token)?;
        let access = resolver.resolve_access(claims.sub).await?;

        Ok(Self {
            id: claims.sub,
            email: claims.email,
            roles: access.roles,
            permissions: access.permissions,
        })
    }
}

fn parse_bearer(value: &axum::http::HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}
