use axum::{extract::Path, extract::State, Json};
use serde::Serialize;

use common_auth::{ensure_admin, ensure_any_permission, ensure_role, AuthContext, ROLE_ADMIN};

use crate::error::{ApiError, ApiResult};
use crate::seeder::{self, SeedReport};
use crate::store::{Permission, Role};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
}

pub async fn list_permissions(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Permission>>> {
    ensure_any_permission(&auth, &["permission:read", "admin:access"])?;
    let permissions = state.store.list_permissions().await?;
    Ok(Json(permissions))
}

pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(name): Path<String>,
) -> ApiResult<Json<RoleDetail>> {
    ensure_role(&auth, &[ROLE_ADMIN])?;

    let role = state
        .store
        .find_role_by_name(&name)
        .await?
        .ok_or(ApiError::NotFound("Role"))?;
    let permissions = state
        .store
        .find_permissions_for_role(role.id)
        .await?
        .into_iter()
        .map(|permission| permission.name)
        .collect();

    Ok(Json(RoleDetail { role, permissions }))
}

pub async fn run_seed(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<SeedReport>> {
    ensure_admin(&auth)?;
    let report = seeder::seed_all(state.store.as_ref()).await?;
    state.metrics.record_seed(&report);
    Ok(Json(report))
}
