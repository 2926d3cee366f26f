use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use common_auth::roles::{ROLE_ADMIN, ROLE_EDITOR, ROLE_USER, ROLE_VIEWER};

use crate::store::{CredentialStore, StoreResult};

pub const PERMISSION_CATEGORIES: &[&str] = &[
    "user",
    "role",
    "permission",
    "widget",
    "chat",
    "model",
    "scrape",
    "analytics",
];

pub const PERMISSION_ACTIONS: &[&str] = &["create", "read", "update", "delete"];

/// Category/action combinations that must never exist. Permissions are
/// immutable catalog entries and analytics data is produced, not edited.
const EXCLUDED_PERMISSIONS: &[&str] = &[
    "permission:create",
    "permission:update",
    "permission:delete",
    "analytics:create",
    "analytics:update",
    "analytics:delete",
];

/// Standalone gate for the admin console, outside the category grid.
pub const ADMIN_ACCESS_PERMISSION: &str = "admin:access";

struct RoleSeed {
    name: &'static str,
    description: &'static str,
    is_default: bool,
    is_system: bool,
    grants: RoleGrants,
}

#[derive(Clone, Copy)]
enum RoleGrants {
    /// Every permission present in the store at seed time. Re-running the
    /// seeder after the catalog grows widens the grant accordingly.
    All,
    Named(&'static [&'static str]),
}

const ROLE_SEEDS: &[RoleSeed] = &[
    RoleSeed {
        name: ROLE_ADMIN,
        description: "Full administrative access",
        is_default: false,
        is_system: true,
        grants: RoleGrants::All,
    },
    RoleSeed {
        name: ROLE_EDITOR,
        description: "Manage widgets, chats, models, and scraping",
        is_default: false,
        is_system: false,
        grants: RoleGrants::Named(&[
            "widget:create",
            "widget:read",
            "widget:update",
            "widget:delete",
            "chat:create",
            "chat:read",
            "chat:update",
            "chat:delete",
            "model:create",
            "model:read",
            "model:update",
            "model:delete",
            "scrape:create",
            "scrape:read",
            "scrape:update",
            "scrape:delete",
            "analytics:read",
            "user:read",
        ]),
    },
    RoleSeed {
        name: ROLE_VIEWER,
        description: "Read-only access to the console",
        is_default: false,
        is_system: false,
        grants: RoleGrants::Named(&[
            "widget:read",
            "chat:read",
            "model:read",
            "scrape:read",
            "analytics:read",
            "user:read",
            "role:read",
            "permission:read",
        ]),
    },
    RoleSeed {
        name: ROLE_USER,
        description: "Default role for new accounts",
        is_default: true,
        is_system: false,
        grants: RoleGrants::Named(&["widget:read", "chat:read"]),
    },
];

#[derive(Debug, Default, Clone, Serialize)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub permissions_existing: usize,
    pub permissions_failed: usize,
    pub roles_created: usize,
    pub roles_updated: usize,
    pub roles_failed: usize,
    pub grants_added: usize,
    pub grants_failed: usize,
}

struct CatalogEntry {
    name: String,
    description: String,
    category: String,
    action: String,
}

fn permission_catalog() -> Vec<CatalogEntry> {
    let mut catalog = Vec::new();
    for category in PERMISSION_CATEGORIES {
        for action in PERMISSION_ACTIONS {
            let name = format!("{category}:{action}");
            if EXCLUDED_PERMISSIONS.contains(&name.as_str()) {
                continue;
            }
            catalog.push(CatalogEntry {
                name,
                description: format!("Can {action} {category}"),
                category: category.to_string(),
                action: action.to_string(),
            });
        }
    }
    catalog.push(CatalogEntry {
        name: ADMIN_ACCESS_PERMISSION.to_string(),
        description: "Grants access to the admin console".to_string(),
        category: "admin".to_string(),
        action: "access".to_string(),
    });
    catalog
}

/// Seeds permissions, then roles. Permissions must exist before role grants
/// can reference them, so the order is fixed.
pub async fn seed_all(store: &dyn CredentialStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();
    seed_permissions(store, &mut report).await?;
    seed_roles(store, &mut report).await?;
    info!(
        permissions_created = report.permissions_created,
        roles_created = report.roles_created,
        grants_added = report.grants_added,
        "seeding complete"
    );
    Ok(report)
}

/// Creates every missing catalog permission. Safe to re-run: existing rows
/// are counted and left alone. A failed lookup aborts (the store is
/// unreachable); a failed create is logged and counted.
pub async fn seed_permissions(
    store: &dyn CredentialStore,
    report: &mut SeedReport,
) -> StoreResult<()> {
    for entry in permission_catalog() {
        match store.find_permission_by_name(&entry.name).await? {
            Some(_) => report.permissions_existing += 1,
            None => {
                match store
                    .create_permission(&entry.name, &entry.description, &entry.category, &entry.action)
                    .await
                {
                    Ok(_) => report.permissions_created += 1,
                    Err(err) => {
                        warn!(permission = %entry.name, error = %err, "failed to create permission");
                        report.permissions_failed += 1;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Creates or updates the built-in roles and tops up their grants. The
/// merge is one-directional: missing grants are added, surplus grants are
/// never revoked here.
pub async fn seed_roles(store: &dyn CredentialStore, report: &mut SeedReport) -> StoreResult<()> {
    for seed in ROLE_SEEDS {
        let role = match store.find_role_by_name(seed.name).await? {
            Some(existing) => {
                if existing.description.as_deref() != Some(seed.description) {
                    match store.update_role(existing.id, seed.description).await {
                        Ok(()) => report.roles_updated += 1,
                        Err(err) => {
                            warn!(role = seed.name, error = %err, "failed to update role");
                        }
                    }
                }
                existing
            }
            None => match store
                .create_role(seed.name, seed.description, seed.is_default, seed.is_system)
                .await
            {
                Ok(created) => {
                    report.roles_created += 1;
                    created
                }
                Err(err) => {
                    warn!(role = seed.name, error = %err, "failed to create role");
                    report.roles_failed += 1;
                    continue;
                }
            },
        };

        let desired: Vec<String> = match seed.grants {
            RoleGrants::All => store
                .list_permissions()
                .await?
                .into_iter()
                .map(|permission| permission.name)
                .collect(),
            RoleGrants::Named(names) => names.iter().map(|name| name.to_string()).collect(),
        };

        let held: HashSet<String> = store
            .find_permissions_for_role(role.id)
            .await?
            .into_iter()
            .map(|permission| permission.name)
            .collect();

        for name in desired {
            if held.contains(&name) {
                continue;
            }

            let Some(permission) = store.find_permission_by_name(&name).await? else {
                warn!(role = seed.name, permission = %name, "grant references unknown permission");
                report.grants_failed += 1;
                continue;
            };

            match store.create_role_permission(role.id, permission.id).await {
                Ok(()) => report.grants_added += 1,
                Err(err) => {
                    warn!(role = seed.name, permission = %name, error = %err, "failed to grant permission");
                    report.grants_failed += 1;
                }
            }
        }
    }
    Ok(())
}
